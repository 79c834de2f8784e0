//! Submission timestamp jitter.
//!
//! Stored submission times are shifted by a uniform whole-minute offset in
//! `[-window, +window]`, drawn from the OS CSPRNG.

use rand::rngs::OsRng;
use rand::Rng;

const SECS_PER_MINUTE: i64 = 60;

/// Perturb a Unix timestamp (seconds) by up to `window_minutes` either way.
///
/// A non-positive window returns the input unchanged.
pub fn apply_jitter(timestamp: u64, window_minutes: i64) -> u64 {
    if window_minutes <= 0 {
        return timestamp;
    }
    let offset_minutes = OsRng.gen_range(-window_minutes..=window_minutes);
    timestamp.saturating_add_signed(offset_minutes.saturating_mul(SECS_PER_MINUTE))
}

/// Current Unix time in seconds.
pub fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
