//! SHA-256 of downloaded bytes.
//!
//! `Sha256Digest` is fed chunk by chunk on the consumer side as the data
//! stream is drained, so verifying a download needs no second pass over the
//! output. `sha256_path` hashes a file already on disk.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Incremental SHA-256 over a stream of chunks.
#[derive(Debug, Clone, Default)]
pub struct Sha256Digest {
    hasher: Sha256,
    bytes: u64,
}

impl Sha256Digest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.bytes += chunk.len() as u64;
    }

    /// Number of bytes folded in so far.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    /// Lowercase hex digest.
    pub fn finalize_hex(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// True if `actual` equals `expected`, ignoring ASCII case and surrounding whitespace.
pub fn digest_matches(actual: &str, expected: &str) -> bool {
    actual.trim().eq_ignore_ascii_case(expected.trim())
}

/// Compute SHA-256 of a file and return the digest as lowercase hex.
/// Reads in chunks to keep memory use bounded; suitable for large files.
pub fn sha256_path(path: &Path) -> Result<String> {
    let mut f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut digest = Sha256Digest::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = f
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if n == 0 {
            break;
        }
        digest.update(&buf[..n]);
    }
    Ok(digest.finalize_hex())
}
