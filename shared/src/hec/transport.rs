//! Transport decoding of request bodies.
//!
//! Turns a raw request body into a byte reader according to the declared
//! `Content-Encoding`.

use crate::hec::{DecodeError, GZIP_ENCODING};
use flate2::read::MultiGzDecoder;
use std::io::{self, BufReader, Read};

/// Gzip member header magic bytes followed by the deflate method id.
const GZIP_MAGIC: [u8; 3] = [0x1f, 0x8b, 0x08];

/// Minimum size of a gzip member header.
const GZIP_HEADER_LEN: usize = 10;

/// Supported request body encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    /// No encoding, the body is plain JSON.
    Identity,
    /// The body is a gzip stream.
    Gzip,
}

impl ContentEncoding {
    /// Parses the value of a `Content-Encoding` header.
    ///
    /// An absent or empty header means identity; `gzip` must match exactly.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::UnsupportedEncoding` for any other value.
    pub fn from_header(value: Option<&str>) -> Result<Self, DecodeError> {
        match value {
            None | Some("") => Ok(Self::Identity),
            Some(GZIP_ENCODING) => Ok(Self::Gzip),
            Some(other) => Err(DecodeError::UnsupportedEncoding(other.to_string())),
        }
    }
}

/// Wraps a request body in the reader its encoding requires.
///
/// For gzip the first member header is checked up front; the compressed
/// payload is only inflated as the returned reader is consumed, so corruption
/// past the header surfaces as a read error during decoding. Concatenated
/// members are read as one stream, and trailing bytes that are not a gzip
/// member are a read error.
///
/// # Errors
///
/// Returns `DecodeError::Gzip` if a gzip body does not start with a valid
/// member header.
pub fn body_reader<'a>(
    encoding: ContentEncoding,
    body: &'a [u8],
) -> Result<Box<dyn Read + 'a>, DecodeError> {
    match encoding {
        ContentEncoding::Identity => Ok(Box::new(body)),
        ContentEncoding::Gzip => {
            if body.len() < GZIP_HEADER_LEN || body[..GZIP_MAGIC.len()] != GZIP_MAGIC {
                return Err(DecodeError::Gzip(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "invalid gzip header",
                )));
            }
            Ok(Box::new(BufReader::new(MultiGzDecoder::new(body))))
        }
    }
}
