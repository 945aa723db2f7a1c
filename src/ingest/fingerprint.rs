// src/ingest/fingerprint.rs
use sha2::{Digest, Sha256};
use std::fmt::Write as _;

/// Stable article identity: lowercase hex SHA-256 of the link bytes.
pub fn fingerprint(link: &str) -> String {
    let digest = Sha256::digest(link.as_bytes());
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
