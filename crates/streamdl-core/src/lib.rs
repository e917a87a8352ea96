//! Streaming single-GET HTTP downloads.
//!
//! [`StreamingDownloader`] reads a response body in bounded chunks and
//! publishes them on a data stream while reporting failures on a separate
//! error stream. The transport is injected through [`HttpClient`];
//! [`CurlClient`] is the libcurl implementation.

pub mod checksum;
pub mod config;
pub mod control;
pub mod downloader;
pub mod error;
pub mod logging;
pub mod sink;
pub mod transport;

pub use control::CancelToken;
pub use downloader::{DownloadSummary, Outcome, StreamingDownloader};
pub use error::{DownloadError, ErrorKind, TransportError};
pub use transport::{CurlClient, DownloadRequest, HttpClient, HttpResponse};
