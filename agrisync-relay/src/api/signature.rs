//! Slack request signing (v0 scheme)
//!
//! `v0=` + hex(HMAC-SHA256(signing_secret, "v0:" + timestamp + ":" + raw_body))

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

const VERSION_PREFIX: &str = "v0=";

fn mac(secret: &str, timestamp: &str, body: &[u8]) -> Option<HmacSha256> {
    // HMAC accepts keys of any length, so this never fails in practice
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Some(mac)
}

/// Signature header value for a request
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    match mac(secret, timestamp, body) {
        Some(mac) => format!("{}{:x}", VERSION_PREFIX, mac.finalize().into_bytes()),
        None => String::new(),
    }
}

/// Constant-time check of a presented signature
pub fn verify_signature(secret: &str, timestamp: &str, body: &[u8], signature: &str) -> bool {
    let Some(hex_digest) = signature.strip_prefix(VERSION_PREFIX) else {
        return false;
    };
    let Ok(presented) = hex::decode(hex_digest) else {
        return false;
    };
    mac(secret, timestamp, body).is_some_and(|mac| mac.verify_slice(&presented).is_ok())
}
