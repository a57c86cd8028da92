//! Replay protection based on the delivery timestamp header.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use super::error::WebhookError;

/// Current Unix time in seconds.
pub fn now_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Validate a delivery timestamp against the allowed clock drift.
///
/// The header must be a non-empty run of ASCII digits. A `max_drift_seconds`
/// of zero or less disables the window check. A drift exactly equal to the
/// window is accepted.
///
/// Returns the parsed timestamp on success.
pub fn check_timestamp(
    header_value: &str,
    now: u64,
    max_drift_seconds: i64,
) -> Result<u64, WebhookError> {
    if header_value.is_empty() || !header_value.bytes().all(|b| b.is_ascii_digit()) {
        warn!(length = header_value.len(), "strz_timestamp_invalid");
        return Err(WebhookError::InvalidTimestamp);
    }

    let timestamp: u64 = match header_value.parse() {
        Ok(t) => t,
        Err(_) => {
            warn!(length = header_value.len(), "strz_timestamp_unparseable");
            return Err(WebhookError::InvalidTimestamp);
        }
    };

    if max_drift_seconds <= 0 {
        return Ok(timestamp);
    }

    let drift = now.abs_diff(timestamp);
    if drift > max_drift_seconds.unsigned_abs() {
        warn!(
            drift_seconds = drift,
            max_drift_seconds = max_drift_seconds,
            "strz_timestamp_out_of_range"
        );
        return Err(WebhookError::TimestampOutOfRange);
    }

    Ok(timestamp)
}
