use std::time::Duration;

use chrono::Utc;

/// Milliseconds since the unix epoch (wall clock).
pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

/// Time left until the next wall-clock multiple of `interval`.
///
/// With a one hour interval this is the distance to the top of the next hour.
/// Returns `Duration::ZERO` when `now_ms` sits exactly on a boundary.
pub fn until_next_boundary(now_ms: u64, interval: Duration) -> Duration {
    let period = interval.as_millis() as u64;
    if period == 0 {
        return Duration::ZERO;
    }

    let into_period = now_ms % period;
    if into_period == 0 {
        return Duration::ZERO;
    }

    Duration::from_millis(period - into_period)
}
