//! CryptoStrazo webhook signature verification.
//!
//! The sender signs `HMAC-SHA256(secret, base)` where `base` is the configured
//! template with `{timestamp}` and `{body}` substituted. The body is the raw
//! request bytes exactly as received.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Optional scheme prefix on the signature header.
const SCHEME_PREFIX: &str = "v1=";

/// Build the signing base string by template substitution.
///
/// Works on bytes so that a body that is not valid UTF-8 still produces the
/// exact sequence the sender signed.
pub fn signing_base(base_format: &str, timestamp: u64, raw_body: &[u8]) -> Vec<u8> {
    let rendered = base_format.replace("{timestamp}", &timestamp.to_string());

    let mut base = Vec::with_capacity(rendered.len() + raw_body.len());
    let mut parts = rendered.split("{body}");
    if let Some(first) = parts.next() {
        base.extend_from_slice(first.as_bytes());
    }
    for part in parts {
        base.extend_from_slice(raw_body);
        base.extend_from_slice(part.as_bytes());
    }
    base
}

/// Compute the lowercase hex signature for a delivery.
pub fn compute_signature(secret: &str, timestamp: u64, raw_body: &[u8], base_format: &str) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::new(),
    };
    mac.update(&signing_base(base_format, timestamp, raw_body));
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a CryptoStrazo webhook signature.
///
/// # Arguments
///
/// * `secret` - Shared signing secret
/// * `timestamp` - Already validated delivery timestamp
/// * `raw_body` - Unmodified request body
/// * `received` - Value of the signature header
/// * `base_format` - Signing base template
///
/// # Returns
///
/// `true` only when the normalized received signature equals the expected one.
pub fn verify(secret: &str, timestamp: u64, raw_body: &[u8], received: &str, base_format: &str) -> bool {
    let expected = compute_signature(secret, timestamp, raw_body, base_format);
    let received = normalize(received);

    let valid = !expected.is_empty() && constant_time_compare(&expected, &received);

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = received.len(),
            "strz_signature_mismatch"
        );
    }

    valid
}

/// Normalize a received signature: trim, drop a `v1=` prefix, lowercase.
pub fn normalize(signature: &str) -> String {
    let trimmed = signature.trim();
    let unprefixed = match trimmed.get(..SCHEME_PREFIX.len()) {
        Some(head) if head.eq_ignore_ascii_case(SCHEME_PREFIX) => &trimmed[SCHEME_PREFIX.len()..],
        _ => trimmed,
    };
    unprefixed.trim().to_ascii_lowercase()
}

/// Constant-time string comparison to prevent timing attacks.
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
