//! HTTP transport seam.
//!
//! The downloader only needs "send a request, get a response or a failure",
//! captured by [`HttpClient`]. [`CurlClient`] is the libcurl-backed
//! implementation; tests plug in in-memory fakes.

mod curl_client;
mod headers;

pub use curl_client::CurlClient;

use crate::control::CancelToken;
use crate::error::TransportError;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use url::Url;

/// Immutable GET request for one download.
///
/// The optional cancel token lets a transport abandon a request that is
/// still waiting on the network.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    url: Url,
    headers: HashMap<String, String>,
    cancel: Option<CancelToken>,
}

impl DownloadRequest {
    /// GET `url` with no extra headers.
    pub fn get(url: Url) -> Self {
        Self {
            url,
            headers: HashMap::new(),
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn method(&self) -> &'static str {
        "GET"
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn cancel_token(&self) -> Option<&CancelToken> {
        self.cancel.as_ref()
    }
}

/// Streaming response body. `Ok(0)` from `read` is end-of-stream.
pub type Body = Box<dyn Read + Send>;

/// Response head plus a body that is read incrementally.
///
/// Dropping the response releases the body (for [`CurlClient`] this aborts
/// a transfer that is still running).
pub struct HttpResponse {
    status: u32,
    headers: Vec<(String, String)>,
    body: Body,
}

impl HttpResponse {
    pub fn new(status: u32, headers: Vec<(String, String)>, body: Body) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// HTTP status code; 0 when the transport has none to report.
    pub fn status(&self) -> u32 {
        self.status
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Send a request, return the response head with a streaming body.
pub trait HttpClient {
    fn execute(&self, request: &DownloadRequest) -> Result<HttpResponse, TransportError>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn execute(&self, request: &DownloadRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<C: HttpClient + ?Sized> HttpClient for std::sync::Arc<C> {
    fn execute(&self, request: &DownloadRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}
