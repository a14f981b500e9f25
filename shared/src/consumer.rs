//! Downstream consumer traits and implementations.
//!
//! A consumer receives finished batches from the gateway and reports success
//! or failure. Consumers are called concurrently from many requests and must be
//! safe to share across tasks.

use crate::models::{LogsBatch, MetricsBatch};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use thiserror::Error;

/// Receives metrics batches.
#[async_trait]
pub trait MetricsConsumer: Send + Sync {
    /// Consumes one metrics batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be accepted.
    async fn consume_metrics(&self, batch: MetricsBatch) -> anyhow::Result<()>;
}

/// Receives logs batches.
#[async_trait]
pub trait LogsConsumer: Send + Sync {
    /// Consumes one logs batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch could not be accepted.
    async fn consume_logs(&self, batch: LogsBatch) -> anyhow::Result<()>;
}

/// Errors raised by the built-in consumers.
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Failed to acquire the lock on an in-memory sink.
    #[error("Failed to acquire lock on in-memory sink")]
    LockError,

    /// The consumer refused the batch.
    #[error("batch rejected: {0}")]
    Rejected(String),
}

/// Keeps every metrics batch it receives in memory.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetricsSink {
    batches: Arc<RwLock<Vec<MetricsBatch>>>,
}

impl InMemoryMetricsSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the received batches, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn batches(&self) -> Result<Vec<MetricsBatch>, ConsumerError> {
        let batches = self.batches.read().map_err(|_| ConsumerError::LockError)?;
        Ok(batches.clone())
    }

    /// Number of received batches.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn batch_count(&self) -> Result<usize, ConsumerError> {
        let batches = self.batches.read().map_err(|_| ConsumerError::LockError)?;
        Ok(batches.len())
    }
}

#[async_trait]
impl MetricsConsumer for InMemoryMetricsSink {
    async fn consume_metrics(&self, batch: MetricsBatch) -> anyhow::Result<()> {
        let mut batches = self.batches.write().map_err(|_| ConsumerError::LockError)?;
        batches.push(batch);
        Ok(())
    }
}

/// Keeps every logs batch it receives in memory.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogsSink {
    batches: Arc<RwLock<Vec<LogsBatch>>>,
}

impl InMemoryLogsSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the received batches, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn batches(&self) -> Result<Vec<LogsBatch>, ConsumerError> {
        let batches = self.batches.read().map_err(|_| ConsumerError::LockError)?;
        Ok(batches.clone())
    }

    /// Number of received batches.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub fn batch_count(&self) -> Result<usize, ConsumerError> {
        let batches = self.batches.read().map_err(|_| ConsumerError::LockError)?;
        Ok(batches.len())
    }
}

#[async_trait]
impl LogsConsumer for InMemoryLogsSink {
    async fn consume_logs(&self, batch: LogsBatch) -> anyhow::Result<()> {
        let mut batches = self.batches.write().map_err(|_| ConsumerError::LockError)?;
        batches.push(batch);
        Ok(())
    }
}

/// Logs a summary of each batch and discards it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingConsumer;

#[async_trait]
impl MetricsConsumer for LoggingConsumer {
    async fn consume_metrics(&self, batch: MetricsBatch) -> anyhow::Result<()> {
        tracing::info!(
            resources = batch.resource_metrics.len(),
            data_points = batch.data_point_count(),
            "Received metrics batch"
        );
        Ok(())
    }
}

#[async_trait]
impl LogsConsumer for LoggingConsumer {
    async fn consume_logs(&self, batch: LogsBatch) -> anyhow::Result<()> {
        tracing::info!(
            resources = batch.resource_logs.len(),
            log_records = batch.log_record_count(),
            "Received logs batch"
        );
        Ok(())
    }
}

/// Rejects every batch with a fixed message.
#[derive(Debug, Clone)]
pub struct FailingConsumer {
    message: String,
}

impl FailingConsumer {
    /// Creates a consumer that fails with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl MetricsConsumer for FailingConsumer {
    async fn consume_metrics(&self, _batch: MetricsBatch) -> anyhow::Result<()> {
        Err(ConsumerError::Rejected(self.message.clone()).into())
    }
}

#[async_trait]
impl LogsConsumer for FailingConsumer {
    async fn consume_logs(&self, _batch: LogsBatch) -> anyhow::Result<()> {
        Err(ConsumerError::Rejected(self.message.clone()).into())
    }
}
