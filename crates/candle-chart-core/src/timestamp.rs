//! Normalization of CSV timestamps to epoch seconds (UTC).
//!
//! Two shapes are recognized: an all-digit count of epoch seconds, and an ISO-8601
//! local date-time (`YYYY-MM-DDTHH:MM[:SS[.fraction]]`) read as UTC. Fractional
//! seconds are truncated, never rounded.

use chrono::NaiveDateTime;
use tracing::warn;

use crate::error::TimestampError;

/// Value returned by [`normalize`] when a timestamp cannot be parsed.
pub const EPOCH_FALLBACK: i64 = 0;

/// Length of `YYYY-MM-DDTHH:MM:SS`; anything past it is a fractional component.
const SECOND_PRECISION_LEN: usize = 19;

const ISO_SECONDS: &str = "%Y-%m-%dT%H:%M:%S";
const ISO_MINUTES: &str = "%Y-%m-%dT%H:%M";

/// Fixed-width layout of [`ISO_SECONDS`]; `d` marks a required ASCII digit.
/// The minute form is its first 16 bytes.
const ISO_SHAPE: &[u8; SECOND_PRECISION_LEN] = b"dddd-dd-ddTdd:dd:dd";
const MINUTE_PRECISION_LEN: usize = 16;

/// Parse a raw timestamp into epoch seconds, reporting why it failed.
pub fn parse_timestamp(raw: &str) -> Result<i64, TimestampError> {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        return raw.parse::<i64>().map_err(|_| TimestampError::Overflow {
            raw: raw.to_string(),
        });
    }

    let format_error = || TimestampError::Format {
        raw: raw.to_string(),
    };

    let truncated = if raw.len() > SECOND_PRECISION_LEN {
        raw.get(..SECOND_PRECISION_LEN).ok_or_else(format_error)?
    } else {
        raw
    };

    let format = match truncated.len() {
        SECOND_PRECISION_LEN => ISO_SECONDS,
        MINUTE_PRECISION_LEN => ISO_MINUTES,
        _ => return Err(format_error()),
    };
    if !matches_iso_shape(truncated.as_bytes()) {
        return Err(format_error());
    }

    NaiveDateTime::parse_from_str(truncated, format)
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|_| format_error())
}

// chrono accepts single-digit fields and leading whitespace, so the layout is
// checked byte by byte first.
fn matches_iso_shape(bytes: &[u8]) -> bool {
    bytes.iter().zip(ISO_SHAPE).all(|(&b, &expected)| match expected {
        b'd' => b.is_ascii_digit(),
        separator => b == separator,
    })
}

/// Total form of [`parse_timestamp`]: logs the failure and returns [`EPOCH_FALLBACK`].
///
/// A `0` result is ambiguous on its own; use [`parse_timestamp`] when genuine
/// epoch-start data must be told apart from a fallback.
pub fn normalize(raw: &str) -> i64 {
    parse_timestamp(raw).unwrap_or_else(|e| {
        warn!(raw, error = %e, "timestamp fell back to epoch start");
        EPOCH_FALLBACK
    })
}
