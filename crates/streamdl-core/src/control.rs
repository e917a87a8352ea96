//! Cancellation for a running download.
//!
//! A `CancelToken` is shared between the thread running
//! [`StreamingDownloader::start`](crate::downloader::StreamingDownloader::start)
//! and whoever may want to stop it (e.g. a Ctrl-C handler). The read loop
//! checks the token before every body read and stops when it is set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable abort flag. All clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the download stop at its next read. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let token = CancelToken::new();
        let other = token.clone();
        assert!(!other.is_cancelled());
        token.cancel();
        assert!(other.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_from_another_thread() {
        let token = CancelToken::new();
        let t = token.clone();
        std::thread::spawn(move || t.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }
}
