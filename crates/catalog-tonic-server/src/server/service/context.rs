//! Cooperative cancellation and deadline checks.
//!
//! Long-running operations poll these at iteration boundaries instead of
//! relying on implicit cooperative yielding, so an aborted call stops within
//! one step and leaves no durable state behind.

use catalog_tonic_core::Error;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tonic::metadata::MetadataMap;

/// Extracts the caller's absolute deadline from the `grpc-timeout` request
/// header, when present.
///
/// The header value is an ASCII integer followed by a unit suffix
/// (`H`/`M`/`S`/`m`/`u`/`n`); a malformed value is treated as no deadline.
pub fn request_deadline(metadata: &MetadataMap) -> Option<Instant> {
    let raw = metadata.get("grpc-timeout")?.to_str().ok()?;
    if raw.len() < 2 {
        return None;
    }

    let (digits, unit) = raw.split_at(raw.len() - 1);
    let value: u64 = digits.parse().ok()?;

    let timeout = match unit {
        "H" => Duration::from_secs(value.checked_mul(3600)?),
        "M" => Duration::from_secs(value.checked_mul(60)?),
        "S" => Duration::from_secs(value),
        "m" => Duration::from_millis(value),
        "u" => Duration::from_micros(value),
        "n" => Duration::from_nanos(value),
        _ => return None,
    };

    Instant::now().checked_add(timeout)
}

/// Fails fast when the caller is gone or out of time.
///
/// Shutdown wins over an expired deadline when both hold.
pub fn ensure_live(cancel: &CancellationToken, deadline: Option<Instant>) -> Result<(), Error> {
    if cancel.is_cancelled() {
        return Err(Error::RequestCancelled);
    }

    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
        _ => Ok(()),
    }
}
