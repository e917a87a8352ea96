//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body to every GET. Options let a test lie about
//! `Content-Length`, omit it, cut the body short, or answer with an error
//! status. Each connection is closed after one response.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Status line to send; defaults to "200 OK".
    pub status: Option<&'static str>,
    /// Value for `Content-Length`; defaults to the body length.
    pub content_length: Option<String>,
    /// If true, send no `Content-Length` and delimit the body by closing.
    pub omit_content_length: bool,
    /// If set, only this many body bytes are written before closing.
    pub truncate_at: Option<usize>,
}

/// Starts a server in a background thread serving `body`. Returns the base URL
/// (e.g. "http://127.0.0.1:12345/"). The server runs until the process exits.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, ServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: ServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let opts = Arc::new(opts);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let opts = Arc::clone(&opts);
            thread::spawn(move || handle(stream, &body, &opts));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: TcpStream, body: &[u8], opts: &ServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let method = request.split_whitespace().next().unwrap_or("");
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }

    let status = opts.status.unwrap_or("200 OK");
    let length_header = if opts.omit_content_length {
        String::new()
    } else {
        let value = opts
            .content_length
            .clone()
            .unwrap_or_else(|| body.len().to_string());
        format!("Content-Length: {}\r\n", value)
    };
    let head = format!(
        "HTTP/1.1 {}\r\n{}Connection: close\r\n\r\n",
        status, length_header
    );
    let _ = stream.write_all(head.as_bytes());
    let end = opts.truncate_at.unwrap_or(body.len()).min(body.len());
    let _ = stream.write_all(&body[..end]);
    let _ = stream.flush();
}
