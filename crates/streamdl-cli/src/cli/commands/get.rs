//! `streamdl get` – stream one URL to a file or stdout.
//!
//! The blocking download runs on the blocking pool while a second blocking
//! task drains chunks to the output. Ctrl-C sets the cancel token; the
//! downloader then stops at its next read and closes both streams.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use streamdl_core::checksum::{digest_matches, Sha256Digest};
use streamdl_core::config::FetchConfig;
use streamdl_core::sink;
use streamdl_core::{CancelToken, CurlClient, DownloadError, Outcome, StreamingDownloader};

#[derive(Debug, Clone)]
pub struct GetArgs {
    pub url: String,
    pub output: Option<PathBuf>,
    pub sha256: Option<String>,
}

/// What the writer task saw.
struct Written {
    bytes: u64,
    sha256: String,
}

pub async fn run_get(cfg: FetchConfig, args: GetArgs) -> Result<()> {
    let queue_depth = cfg.body_queue_depth;
    let buffer_size = cfg.read_buffer_bytes;
    let downloader = StreamingDownloader::new(args.url.clone(), CurlClient::new(cfg))
        .with_buffer_size(buffer_size);

    // Bounded data stream: a slow disk or pipe throttles the download.
    let (data_tx, data_rx) = sink::bounded::<Vec<u8>>(queue_depth);
    let (err_tx, err_rx) = sink::unbounded::<DownloadError>();
    let cancel = CancelToken::new();

    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, cancelling download");
                cancel.cancel();
            }
        })
    };

    let producer = {
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || downloader.start(data_tx, err_tx, &cancel))
    };
    let output = args.output.clone();
    let writer = tokio::task::spawn_blocking(move || write_chunks(data_rx, output.as_deref()));

    let summary = producer.await.context("download task panicked")?;
    let written = writer.await.context("writer task panicked")?;
    interrupt.abort();

    // The producer has returned, so the error stream is closed and this ends.
    let errors: Vec<DownloadError> = err_rx.iter().collect();
    for e in &errors {
        eprintln!("streamdl: {}", e);
    }

    let written = written?;
    tracing::info!(
        url = %args.url,
        bytes = written.bytes,
        outcome = ?summary.outcome,
        "get finished"
    );

    match summary.outcome {
        Outcome::Completed => {}
        Outcome::Cancelled => anyhow::bail!("download cancelled after {} bytes", written.bytes),
        Outcome::Failed => anyhow::bail!("download of {} failed", args.url),
        Outcome::ConsumerGone => anyhow::bail!("output closed after {} bytes", written.bytes),
    }
    // A missing or unparsable Content-Length still completes, but the size
    // of the file could not be checked.
    if !errors.is_empty() {
        anyhow::bail!(
            "download of {} reported {} error(s) after {} bytes",
            args.url,
            errors.len(),
            written.bytes
        );
    }

    if let Some(expected) = args.sha256.as_deref() {
        if !digest_matches(&written.sha256, expected) {
            anyhow::bail!(
                "checksum mismatch: expected {}, got {}",
                expected.trim(),
                written.sha256
            );
        }
        tracing::debug!("checksum verified: {}", written.sha256);
    }

    if let Some(path) = args.output.as_deref() {
        eprintln!("{}  {} ({} bytes)", written.sha256, path.display(), written.bytes);
    }
    Ok(())
}

/// Drain chunks into `output` (stdout when `None`) until the stream closes.
/// On a write error the receiver is dropped, which stops the downloader.
fn write_chunks(rx: Receiver<Vec<u8>>, output: Option<&Path>) -> Result<Written> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut out = BufWriter::new(sink);
    let mut digest = Sha256Digest::new();

    for chunk in rx.iter() {
        out.write_all(&chunk).context("write output")?;
        digest.update(&chunk);
    }
    out.flush().context("flush output")?;

    Ok(Written {
        bytes: digest.bytes(),
        sha256: digest.finalize_hex(),
    })
}
