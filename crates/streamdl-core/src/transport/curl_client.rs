//! libcurl-backed [`HttpClient`].
//!
//! Curl pushes data through callbacks while the downloader pulls from a
//! `Read`. The transfer therefore runs on its own thread: header lines are
//! collected into a [`ResponseHead`], which is handed to the caller as soon
//! as the first body bytes arrive, and body buffers flow through a bounded
//! channel into [`ChannelBody`]. Dropping the body makes the next write
//! callback fail, which aborts the transfer. A cancel token on the request
//! is polled from the progress callback, so a transfer still waiting on the
//! network is aborted too.

use super::headers::ResponseHead;
use super::{DownloadRequest, HttpClient, HttpResponse};
use crate::config::FetchConfig;
use crate::control::CancelToken;
use crate::error::TransportError;
use curl::easy::{Easy, List};
use std::cell::{Cell, RefCell};
use std::io::{self, Read};
use std::str;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

type HeadResult = Result<ResponseHead, TransportError>;
type BodyItem = io::Result<Vec<u8>>;

/// Transport that performs each request with a fresh curl `Easy` handle.
#[derive(Debug, Clone, Default)]
pub struct CurlClient {
    config: FetchConfig,
}

impl CurlClient {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    fn configure(&self, request: &DownloadRequest) -> Result<Easy, curl::Error> {
        let cfg = &self.config;
        let mut easy = Easy::new();
        easy.url(request.url().as_str())?;
        easy.get(true)?;
        easy.follow_location(true)?;
        easy.max_redirections(cfg.max_redirections)?;
        easy.connect_timeout(cfg.connect_timeout())?;
        easy.low_speed_limit(cfg.low_speed_limit)?;
        easy.low_speed_time(cfg.low_speed_time())?;
        if let Some(t) = cfg.timeout() {
            easy.timeout(t)?;
        }
        if let Some(ua) = cfg.user_agent.as_deref() {
            easy.useragent(ua)?;
        }
        if request.cancel_token().is_some() {
            easy.progress(true)?;
        }

        if !request.headers().is_empty() {
            let mut list = List::new();
            for (k, v) in request.headers() {
                list.append(&format!("{}: {}", k.trim(), v.trim()))?;
            }
            easy.http_headers(list)?;
        }
        Ok(easy)
    }
}

impl HttpClient for CurlClient {
    fn execute(&self, request: &DownloadRequest) -> Result<HttpResponse, TransportError> {
        let easy = self.configure(request)?;
        let (head_tx, head_rx) = mpsc::sync_channel::<HeadResult>(1);
        let (body_tx, body_rx) = mpsc::sync_channel::<BodyItem>(self.config.body_queue_depth.max(1));
        let url = request.url().to_string();
        let cancel = request.cancel_token().cloned();

        thread::Builder::new()
            .name("streamdl-curl".to_string())
            .spawn(move || run_transfer(easy, &url, cancel, head_tx, body_tx))?;

        match head_rx.recv() {
            Ok(Ok(head)) => Ok(HttpResponse::new(
                head.status,
                head.headers,
                Box::new(ChannelBody::new(body_rx)),
            )),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TransportError::NoResponse),
        }
    }
}

/// Shared between the header and write callbacks of one transfer.
struct TransferState {
    head: RefCell<ResponseHead>,
    head_sent: Cell<bool>,
    reader_gone: Cell<bool>,
    cancel: Option<CancelToken>,
    head_tx: SyncSender<HeadResult>,
    body_tx: SyncSender<BodyItem>,
}

impl TransferState {
    fn on_header(&self, data: &[u8]) {
        if let Ok(s) = str::from_utf8(data) {
            self.head.borrow_mut().push_line(s);
        }
    }

    /// Hand the collected head to the caller, once.
    fn hand_over(&self) {
        if !self.head_sent.replace(true) {
            let _ = self.head_tx.send(Ok(self.head.borrow().clone()));
        }
    }

    /// Returns false when the reader has been dropped.
    fn on_body(&self, data: &[u8]) -> bool {
        self.hand_over();
        if self.body_tx.send(Ok(data.to_vec())).is_err() {
            self.reader_gone.set(true);
            return false;
        }
        true
    }

    /// Returns false once the request's token has been set.
    fn keep_going(&self) -> bool {
        !self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

fn run_transfer(
    mut easy: Easy,
    url: &str,
    cancel: Option<CancelToken>,
    head_tx: SyncSender<HeadResult>,
    body_tx: SyncSender<BodyItem>,
) {
    let state = TransferState {
        head: RefCell::new(ResponseHead::default()),
        head_sent: Cell::new(false),
        reader_gone: Cell::new(false),
        cancel,
        head_tx,
        body_tx,
    };

    match perform(&mut easy, &state) {
        Ok(()) => {
            // Empty body: no write callback ever fired.
            state.hand_over();
            tracing::debug!("curl transfer of {} finished", url);
        }
        Err(_) if state.reader_gone.get() => {
            tracing::debug!("curl transfer of {} aborted: body released", url);
        }
        Err(e) if !state.keep_going() => {
            tracing::debug!("curl transfer of {} cancelled: {}", url, e);
            if state.head_sent.replace(true) {
                let _ = state.body_tx.send(Err(io::Error::other(e)));
            } else {
                let _ = state.head_tx.send(Err(TransportError::Curl(e)));
            }
        }
        Err(e) if state.head_sent.get() => {
            tracing::debug!("curl transfer of {} failed mid-body: {}", url, e);
            let _ = state.body_tx.send(Err(io::Error::other(e)));
        }
        Err(e) => {
            tracing::debug!("curl transfer of {} failed before response: {}", url, e);
            state.head_sent.set(true);
            let _ = state.head_tx.send(Err(TransportError::Curl(e)));
        }
    }
}

fn perform(easy: &mut Easy, state: &TransferState) -> Result<(), curl::Error> {
    let mut transfer = easy.transfer();
    transfer.header_function(|data| {
        state.on_header(data);
        true
    })?;
    if state.cancel.is_some() {
        transfer.progress_function(|_, _, _, _| state.keep_going())?;
    }
    transfer.write_function(|data| {
        if state.on_body(data) {
            Ok(data.len())
        } else {
            Ok(0) // abort transfer
        }
    })?;
    transfer.perform()
}

/// `Read` over body buffers received from the transfer thread.
/// A closed channel is end-of-stream; an `Err` item is a read error.
struct ChannelBody {
    rx: Receiver<BodyItem>,
    pending: Vec<u8>,
    pos: usize,
}

impl ChannelBody {
    fn new(rx: Receiver<BodyItem>) -> Self {
        Self {
            rx,
            pending: Vec::new(),
            pos: 0,
        }
    }
}

impl Read for ChannelBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.pos >= self.pending.len() {
            match self.rx.recv() {
                Ok(Ok(chunk)) => {
                    self.pending = chunk;
                    self.pos = 0;
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => return Ok(0),
            }
        }
        let n = (self.pending.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn channel_body_splits_and_ends() {
        let (tx, rx) = mpsc::sync_channel::<BodyItem>(4);
        tx.send(Ok(b"hello".to_vec())).unwrap();
        tx.send(Ok(Vec::new())).unwrap();
        tx.send(Ok(b"!".to_vec())).unwrap();
        drop(tx);

        let mut body = ChannelBody::new(rx);
        let mut buf = [0u8; 3];
        assert_eq!(body.read(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"hel");
        assert_eq!(body.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"lo");
        assert_eq!(body.read(&mut buf).unwrap(), 1);
        assert_eq!(buf[0], b'!');
        assert_eq!(body.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn channel_body_surfaces_error() {
        let (tx, rx) = mpsc::sync_channel::<BodyItem>(2);
        tx.send(Ok(b"ab".to_vec())).unwrap();
        tx.send(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")))
            .unwrap();
        let mut body = ChannelBody::new(rx);
        let mut buf = [0u8; 8];
        assert_eq!(body.read(&mut buf).unwrap(), 2);
        let err = body.read(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }

    #[test]
    fn configure_accepts_options() {
        let client = CurlClient::new(FetchConfig {
            user_agent: Some("streamdl-test".to_string()),
            timeout_secs: 5,
            ..FetchConfig::default()
        });
        let req = DownloadRequest::get(Url::parse("http://127.0.0.1:1/x").unwrap())
            .with_cancel(CancelToken::new());
        assert!(client.configure(&req).is_ok());
    }

    #[test]
    fn cancel_aborts_request_waiting_for_response() {
        // Accepts the connection but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let client = CurlClient::new(FetchConfig {
            timeout_secs: 30,
            ..FetchConfig::default()
        });
        let token = CancelToken::new();
        let req = DownloadRequest::get(Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap())
            .with_cancel(token.clone());

        let canceller = {
            let token = token.clone();
            thread::spawn(move || {
                thread::sleep(std::time::Duration::from_millis(200));
                token.cancel();
            })
        };
        let started = std::time::Instant::now();
        let result = client.execute(&req);
        canceller.join().unwrap();

        match result {
            Err(TransportError::Curl(e)) => assert!(e.is_aborted_by_callback(), "{:?}", e),
            other => panic!("expected aborted transfer, got {:?}", other),
        }
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
        drop(listener);
    }

    #[test]
    fn refused_connection_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let client = CurlClient::new(FetchConfig {
            connect_timeout_secs: 2,
            ..FetchConfig::default()
        });
        let req =
            DownloadRequest::get(Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap());
        match client.execute(&req) {
            Err(TransportError::Curl(e)) => assert!(e.is_couldnt_connect()),
            other => panic!("expected curl connect error, got {:?}", other),
        }
    }
}
