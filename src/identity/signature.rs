//! HMAC-SHA256 request signing for vendor webhooks. The signature covers the
//! raw request body, so verification runs before any JSON parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Hex-encode the HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("hmac accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a hex signature over `body`. Comparison is constant-time; malformed
/// hex fails the same way a wrong signature does.
pub fn verify_signature(secret: &str, body: &[u8], provided: &str) -> bool {
    let decoded = match hex::decode(provided.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("hmac accepts keys of any length");
    mac.update(body);
    mac.verify_slice(&decoded).is_ok()
}
