//! Failures reported on the error stream and by HTTP transports.

use std::io;
use thiserror::Error;

/// Error returned by an [`HttpClient`](crate::transport::HttpClient) when a
/// request could not be dispatched or no response head arrived.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Curl reported an error (DNS, connect, TLS, timeout, ...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Any other I/O failure while dispatching.
    #[error("{0}")]
    Io(#[from] io::Error),
    /// The transfer ended without ever producing a response.
    #[error("transfer ended without a response")]
    NoResponse,
}

/// Coarse failure category, one per `DownloadError` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidUrl,
    Request,
    HttpStatus,
    ContentLength,
    Corrupt,
    BodyRead,
}

/// A failure emitted on the error stream of a download.
///
/// None of these abort the process; the downloader sends them as values and
/// keeps ownership of both streams until it closes them.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The configured URL string is not a valid absolute URL.
    #[error("could not parse URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// The transport failed before a response was available.
    #[error("could not perform a request to {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: TransportError,
    },

    /// The server answered with a non-2xx status.
    #[error("GET {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u32 },

    /// `Content-Length` missing or not an integer; the size check is skipped.
    #[error("could not parse Content-Length: {}", display_header(.value))]
    ContentLength { value: Option<String> },

    /// End-of-stream reached with a byte count different from the declared size.
    #[error("corrupt download: read {read} bytes, expected {expected}")]
    Corrupt { expected: i64, read: u64 },

    /// Reading the body failed after `read` bytes were already emitted.
    #[error("failed reading response body after {read} bytes: {source}")]
    BodyRead {
        read: u64,
        #[source]
        source: io::Error,
    },
}

fn display_header(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("{:?}", v),
        None => "header missing".to_string(),
    }
}

impl DownloadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DownloadError::InvalidUrl { .. } => ErrorKind::InvalidUrl,
            DownloadError::Request { .. } => ErrorKind::Request,
            DownloadError::HttpStatus { .. } => ErrorKind::HttpStatus,
            DownloadError::ContentLength { .. } => ErrorKind::ContentLength,
            DownloadError::Corrupt { .. } => ErrorKind::Corrupt,
            DownloadError::BodyRead { .. } => ErrorKind::BodyRead,
        }
    }
}
