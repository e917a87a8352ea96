//! Streaming single-GET downloader.
//!
//! Issues one GET through an injected [`HttpClient`], reads the body in
//! bounded chunks and forwards each read to a chunk sink in body order.
//! Failures go to a separate error sink. At end-of-stream the number of
//! bytes read is checked against `Content-Length` when the server declared
//! one. Both sinks are owned by [`StreamingDownloader::start`] and dropped
//! (closed) when it returns, whatever the outcome.

use crate::config::DEFAULT_READ_BUFFER_BYTES;
use crate::control::CancelToken;
use crate::error::DownloadError;
use crate::sink::{ChunkSink, ErrorSink};
use crate::transport::{DownloadRequest, HttpClient, HttpResponse};
use std::io::{self, Read};
use url::Url;

/// How a `start` call ended. Errors themselves are only on the error sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// End-of-stream reached and the size check passed or was skipped.
    Completed,
    /// At least one terminal error was emitted.
    Failed,
    /// The cancel token was set; no error emitted.
    Cancelled,
    /// The chunk receiver was dropped; nobody is listening.
    ConsumerGone,
}

/// In-process result of one `start` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSummary {
    pub bytes_read: u64,
    /// Parsed `Content-Length`; `None` when missing or invalid.
    pub declared: Option<i64>,
    pub outcome: Outcome,
}

impl DownloadSummary {
    fn new(bytes_read: u64, declared: Option<i64>, outcome: Outcome) -> Self {
        Self {
            bytes_read,
            declared,
            outcome,
        }
    }
}

/// Downloader for one URL over an injected transport. Holds no per-call
/// state, so `start` may be called repeatedly or from several threads.
#[derive(Debug, Clone)]
pub struct StreamingDownloader<C> {
    url: String,
    client: C,
    buffer_size: usize,
}

impl<C: HttpClient> StreamingDownloader<C> {
    /// Store the target and transport. No I/O happens here.
    pub fn new(url: impl Into<String>, client: C) -> Self {
        Self {
            url: url.into(),
            client,
            buffer_size: DEFAULT_READ_BUFFER_BYTES,
        }
    }

    /// Capacity of the read buffer; each body read yields at most this many
    /// bytes and becomes one chunk. Zero is treated as 1.
    pub fn with_buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes.max(1);
        self
    }

    /// Run the download, sending body chunks to `data` and failures to
    /// `errors`. Both sinks are closed when this returns.
    ///
    /// Blocks on the request, on each body read and, with bounded sinks, on
    /// each send. Intended to run on its own thread while the caller drains
    /// the receivers.
    pub fn start<D, E>(&self, data: D, errors: E, cancel: &CancelToken) -> DownloadSummary
    where
        D: ChunkSink,
        E: ErrorSink,
    {
        let summary = self.run(&data, &errors, cancel);
        tracing::debug!(
            url = %self.url,
            bytes = summary.bytes_read,
            outcome = ?summary.outcome,
            "closing download streams"
        );
        drop(data);
        drop(errors);
        summary
    }

    fn run<D, E>(&self, data: &D, errors: &E, cancel: &CancelToken) -> DownloadSummary
    where
        D: ChunkSink,
        E: ErrorSink,
    {
        let url = match Url::parse(&self.url) {
            Ok(u) => u,
            Err(source) => {
                report(
                    errors,
                    DownloadError::InvalidUrl {
                        url: self.url.clone(),
                        source,
                    },
                );
                return DownloadSummary::new(0, None, Outcome::Failed);
            }
        };
        let request = DownloadRequest::get(url).with_cancel(cancel.clone());

        if cancel.is_cancelled() {
            return DownloadSummary::new(0, None, Outcome::Cancelled);
        }

        tracing::debug!("GET {}", request.url());
        let mut response = match self.client.execute(&request) {
            Ok(r) => r,
            Err(source) if cancel.is_cancelled() => {
                tracing::debug!("request for {} abandoned on cancel: {}", self.url, source);
                return DownloadSummary::new(0, None, Outcome::Cancelled);
            }
            Err(source) => {
                report(
                    errors,
                    DownloadError::Request {
                        url: self.url.clone(),
                        source,
                    },
                );
                return DownloadSummary::new(0, None, Outcome::Failed);
            }
        };

        let status = response.status();
        if status != 0 && !(200..300).contains(&status) {
            report(
                errors,
                DownloadError::HttpStatus {
                    url: self.url.clone(),
                    status,
                },
            );
            return DownloadSummary::new(0, None, Outcome::Failed);
        }

        let declared = match declared_size(&response) {
            Ok(n) => Some(n),
            Err(e) => {
                report(errors, e);
                None
            }
        };

        // `response` is dropped when this returns, releasing the body on
        // every exit path.
        let (bytes_read, outcome) = self.stream_body(&mut response, declared, data, errors, cancel);
        if outcome == Outcome::Completed {
            tracing::info!("downloaded {} bytes from {}", bytes_read, self.url);
        }
        DownloadSummary::new(bytes_read, declared, outcome)
    }

    /// The read loop. Returns bytes read and how the loop ended.
    fn stream_body<D, E>(
        &self,
        response: &mut HttpResponse,
        declared: Option<i64>,
        data: &D,
        errors: &E,
        cancel: &CancelToken,
    ) -> (u64, Outcome)
    where
        D: ChunkSink,
        E: ErrorSink,
    {
        let mut buf = vec![0u8; self.buffer_size];
        let mut read: u64 = 0;
        let body = response.body_mut();

        loop {
            if cancel.is_cancelled() {
                tracing::debug!("download of {} cancelled after {} bytes", self.url, read);
                return (read, Outcome::Cancelled);
            }

            match body.read(&mut buf) {
                Ok(0) => {
                    tracing::debug!("end of body after {} bytes", read);
                    return match declared {
                        Some(expected) if i128::from(expected) != i128::from(read) => {
                            report(errors, DownloadError::Corrupt { expected, read });
                            (read, Outcome::Failed)
                        }
                        _ => (read, Outcome::Completed),
                    };
                }
                Ok(n) => {
                    read += n as u64;
                    if data.send(buf[..n].to_vec()).is_err() {
                        tracing::debug!("chunk receiver dropped; stopping {}", self.url);
                        return (read, Outcome::ConsumerGone);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                // A transport that honours the token fails the read it aborts.
                Err(e) if cancel.is_cancelled() => {
                    tracing::debug!("read of {} aborted on cancel: {}", self.url, e);
                    return (read, Outcome::Cancelled);
                }
                Err(source) => {
                    report(errors, DownloadError::BodyRead { read, source });
                    return (read, Outcome::Failed);
                }
            }
        }
    }
}

/// Parse `Content-Length` as a signed 64-bit integer.
fn declared_size(response: &HttpResponse) -> Result<i64, DownloadError> {
    let value = response.header("Content-Length");
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| DownloadError::ContentLength {
            value: value.map(str::to_string),
        })
}

fn report<E: ErrorSink>(errors: &E, err: DownloadError) {
    tracing::warn!("{}", err);
    // A dropped error receiver only means nobody wants the report.
    let _ = errors.send(err);
}
