//! Session ID and device fingerprint generation.
//!
//! Session IDs are 32 cryptographically random bytes, lowercase hex (64
//! chars — 256 bits of randomness). Device fingerprints are an 8-byte
//! (16 hex char) prefix of `SHA-256(UA || ip_prefix)`, informational only.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Mint a new 256-bit session ID, lowercase hex encoded.
pub fn new_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex_encode(&bytes)
}

/// Compute the short device fingerprint for `UA || ip_prefix`.
///
/// `ip_prefix` should already be reduced to the first three dot-separated
/// octets for IPv4 (see [`ip_prefix`]); callers pass the whole string for
/// anything else (IPv6, unparseable).
pub fn device_fingerprint(user_agent: &str, ip_prefix: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_agent.as_bytes());
    hasher.update(ip_prefix.as_bytes());
    let digest = hasher.finalize();
    hex_encode(&digest[..8])
}

/// Reduce an IP address string to its first three dot-separated octets for
/// IPv4, or return the whole string unchanged otherwise.
pub fn ip_prefix(ip: &str) -> String {
    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() == 4 {
        octets[..3].join(".")
    } else {
        ip.to_string()
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}
