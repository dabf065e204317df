//! Webhook signature verification.
//!
//! The gateway signs each delivery with HMAC-SHA256 over `"{t}.{raw body}"`
//! and sends the result in the `stripe-signature` header as comma-separated
//! `t=<unix seconds>,v1=<hex digest>` fields (multiple `v1` entries appear
//! during secret rotation). Verification must run against the raw request
//! body, before any JSON parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::StripeError;

type HmacSha256 = Hmac<Sha256>;

/// Reject events whose signature timestamp is further than this from now.
/// Bounds the replay window for captured deliveries.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Parsed `stripe-signature` header.
#[derive(Debug)]
struct SignatureHeader {
    timestamp: i64,
    v1_signatures: Vec<String>,
}

fn parse_header(header: &str) -> Result<SignatureHeader, StripeError> {
    let mut timestamp = None;
    let mut v1_signatures = Vec::new();

    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = Some(value.parse::<i64>().map_err(|_| {
                    StripeError::SignatureInvalid("malformed timestamp".to_string())
                })?);
            }
            Some(("v1", value)) => v1_signatures.push(value.to_string()),
            _ => {} // unknown scheme versions are ignored
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| StripeError::SignatureInvalid("missing timestamp".to_string()))?;
    if v1_signatures.is_empty() {
        return Err(StripeError::SignatureInvalid(
            "missing v1 signature".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        v1_signatures,
    })
}

/// Compute the expected hex digest for a payload at a given timestamp.
fn expected_signature(timestamp: i64, payload: &[u8], secret: &str) -> String {
    // The key length is arbitrary for HMAC; new_from_slice cannot fail.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Verify a webhook delivery against the signing secret.
///
/// # Errors
///
/// Returns [`StripeError::SignatureInvalid`] when the header is malformed,
/// the timestamp is outside the tolerance window, or no `v1` digest matches.
pub fn verify_signature(payload: &[u8], header: &str, secret: &str) -> Result<(), StripeError> {
    verify_signature_at(payload, header, secret, chrono::Utc::now().timestamp())
}

/// Verification core with an explicit clock, so the tolerance window is
/// testable without real time.
fn verify_signature_at(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
) -> Result<(), StripeError> {
    let parsed = parse_header(header)?;

    if (now - parsed.timestamp).abs() > DEFAULT_TOLERANCE_SECS {
        return Err(StripeError::SignatureInvalid(
            "timestamp outside tolerance".to_string(),
        ));
    }

    let expected = expected_signature(parsed.timestamp, payload, secret);
    if parsed
        .v1_signatures
        .iter()
        .any(|candidate| constant_time_eq(&expected, candidate))
    {
        Ok(())
    } else {
        Err(StripeError::SignatureInvalid(
            "no matching v1 signature".to_string(),
        ))
    }
}
