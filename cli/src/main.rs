//! hecctl
//!
//! Command-line tool for working with HTTP Event Collector payloads.
//!
//! # Usage
//!
//! ```bash
//! hecctl --help
//! hecctl inspect events.json
//! hecctl send events.json --url http://localhost:8088/services/collector --gzip --token tok123
//! ```

#![deny(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flate2::write::GzEncoder;
use flate2::Compression;
use shared::hec::{
    decode_events, hec_to_logs, hec_to_metrics, ClassifiedEvent, HecToOtelAttrs, GZIP_ENCODING,
    HEC_TOKEN_HEADER,
};
use std::io::Write;
use std::path::{Path, PathBuf};

/// hecctl - inspect and send HEC payloads
#[derive(Parser)]
#[command(name = "hecctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a payload file offline and print what it contains
    Inspect {
        /// File of concatenated HEC events
        file: PathBuf,
    },
    /// POST a payload file to a gateway
    Send {
        /// File of concatenated HEC events
        file: PathBuf,

        /// Collector URL
        #[arg(
            short,
            long,
            env = "HECCTL_URL",
            default_value = "http://localhost:8088/services/collector"
        )]
        url: String,

        /// Compress the body with gzip
        #[arg(long)]
        gzip: bool,

        /// Value of the Authorization header
        #[arg(short, long, env = "HECCTL_TOKEN")]
        token: Option<String>,
    },
}

/// What a payload decodes to.
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    metric_events: usize,
    log_events: usize,
    data_points: usize,
    dropped_values: usize,
    log_records: usize,
}

/// Decodes, classifies and converts a payload the way the gateway does.
fn summarize(payload: &[u8]) -> Result<Summary> {
    let mut metrics = Vec::new();
    let mut logs = Vec::new();

    for (index, event) in decode_events(payload).enumerate() {
        match event.with_context(|| format!("event #{index} is malformed"))?.classify() {
            ClassifiedEvent::Metric(metric) => metrics.push(metric),
            ClassifiedEvent::Log(log) => logs.push(log),
        }
    }

    let attrs = HecToOtelAttrs::default();
    let summary = Summary {
        metric_events: metrics.len(),
        log_events: logs.len(),
        ..Summary::default()
    };
    let conversion = hec_to_metrics(metrics, |_| {}, &attrs);
    let batch = hec_to_logs(logs, |_| {}, &attrs);

    Ok(Summary {
        data_points: conversion.batch.data_point_count(),
        dropped_values: conversion.dropped,
        log_records: batch.log_record_count(),
        ..summary
    })
}

fn read_payload(file: &Path) -> Result<Vec<u8>> {
    std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))
}

fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

async fn send(file: &Path, url: &str, compress: bool, token: Option<&str>) -> Result<()> {
    let payload = read_payload(file)?;
    let mut request = reqwest::Client::new().post(url);

    let body = if compress {
        request = request.header(reqwest::header::CONTENT_ENCODING, GZIP_ENCODING);
        gzip(&payload)?
    } else {
        payload
    };
    if let Some(token) = token {
        request = request.header(HEC_TOKEN_HEADER, token);
    }

    tracing::debug!(%url, bytes = body.len(), gzip = compress, "Sending payload");

    let response = request
        .body(body)
        .send()
        .await
        .with_context(|| format!("failed to send to {url}"))?;
    let status = response.status();
    let text = response.text().await.unwrap_or_default();

    println!("{} {text}", status.as_u16());

    if !status.is_success() {
        anyhow::bail!("gateway rejected the payload with status {status}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Inspect { file }) => {
            let summary = summarize(&read_payload(&file)?)?;
            println!("metric events:  {}", summary.metric_events);
            println!("log events:     {}", summary.log_events);
            println!("data points:    {}", summary.data_points);
            println!("dropped values: {}", summary.dropped_values);
            println!("log records:    {}", summary.log_records);
        }
        Some(Commands::Send {
            file,
            url,
            gzip,
            token,
        }) => {
            send(&file, &url, gzip, token.as_deref()).await?;
        }
        None => {
            println!("hecctl v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
        }
    }

    Ok(())
}
