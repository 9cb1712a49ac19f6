use std::time::{Duration, Instant};

/// Returns the remaining delay before the next request may be issued, or
/// `None` when enough time has already passed. The comparison is non-strict:
/// an elapsed time exactly equal to `min_interval` does not wait.
pub fn remaining_delay(last_request: Instant, min_interval: Duration, now: Instant) -> Option<Duration> {
    let elapsed = now.saturating_duration_since(last_request);
    if elapsed >= min_interval {
        None
    } else {
        Some(min_interval - elapsed)
    }
}

/// Predicate form of [`remaining_delay`].
pub fn should_wait(last_request: Instant, min_interval: Duration, now: Instant) -> bool {
    remaining_delay(last_request, min_interval, now).is_some()
}
