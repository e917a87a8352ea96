//! Write-only output streams for chunks and errors.
//!
//! The downloader is generic over its sinks so callers pick the channel
//! flavor: an unbounded `mpsc::Sender` never blocks the read loop, while a
//! bounded `mpsc::SyncSender` blocks on a full queue and so throttles the
//! download to the consumer's pace. A sink is closed by dropping it.

use crate::error::DownloadError;
use std::fmt;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};

/// The receiving side of a sink is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Closed;

impl fmt::Display for Closed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink receiver dropped")
    }
}

impl std::error::Error for Closed {}

/// Single-producer stream of items. Implemented for both std channel senders.
pub trait Sink<T> {
    fn send(&self, item: T) -> Result<(), Closed>;
}

impl<T> Sink<T> for Sender<T> {
    fn send(&self, item: T) -> Result<(), Closed> {
        Sender::send(self, item).map_err(|_| Closed)
    }
}

impl<T> Sink<T> for SyncSender<T> {
    fn send(&self, item: T) -> Result<(), Closed> {
        SyncSender::send(self, item).map_err(|_| Closed)
    }
}

/// Sink of body chunks, in body order.
pub trait ChunkSink: Sink<Vec<u8>> {}
impl<S: Sink<Vec<u8>>> ChunkSink for S {}

/// Sink of download failures.
pub trait ErrorSink: Sink<DownloadError> {}
impl<S: Sink<DownloadError>> ErrorSink for S {}

/// Unbounded channel pair; sends never block.
pub fn unbounded<T>() -> (Sender<T>, Receiver<T>) {
    mpsc::channel()
}

/// Bounded channel pair holding at most `depth` queued items (at least 1).
pub fn bounded<T>(depth: usize) -> (SyncSender<T>, Receiver<T>) {
    mpsc::sync_channel(depth.max(1))
}
