//! Session lifecycle rules: timeout evaluation and client metadata checks.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Default inactivity timeout before a session is ended by cleanup.
pub const DEFAULT_SESSION_TIMEOUT_MINS: i64 = 60;

/// Maximum stored length of the client's device description.
pub const MAX_DEVICE_INFO_LEN: usize = 255;

/// Maximum accepted length of a timezone name.
const MAX_TIMEZONE_LEN: usize = 64;

static TIMEZONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_]+(?:/[A-Za-z0-9_+\-]+){0,2}|[+-](?:0\d|1[0-4]):[0-5]\d)$")
        .expect("valid timezone regex")
});

/// Why a session stopped being active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEndReason {
    Logout,
    Ended,
    Timeout,
}

impl SessionEndReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Logout => "logout",
            Self::Ended => "ended",
            Self::Timeout => "timeout",
        }
    }
}

/// Last-activity instant before which sessions count as timed out.
pub fn timeout_cutoff(now: Timestamp, timeout: chrono::Duration) -> Timestamp {
    now - timeout
}

/// A session is timed out once its inactivity strictly exceeds `timeout`.
pub fn is_timed_out(last_activity_at: Timestamp, now: Timestamp, timeout: chrono::Duration) -> bool {
    last_activity_at < timeout_cutoff(now, timeout)
}

/// Accept IANA-style zone names (`Europe/Berlin`, `UTC`) or fixed offsets
/// (`+02:00`). Returns the trimmed value.
pub fn validate_timezone(tz: &str) -> Result<String, CoreError> {
    let tz = tz.trim();
    if tz.is_empty() || tz.len() > MAX_TIMEZONE_LEN || !TIMEZONE_RE.is_match(tz) {
        return Err(CoreError::Validation(format!("Invalid timezone: '{tz}'")));
    }
    Ok(tz.to_string())
}

/// Clamp free-form device info to the stored column width.
pub fn clamp_device_info(info: &str) -> String {
    info.trim().chars().take(MAX_DEVICE_INFO_LEN).collect()
}
