//! Timestamp helpers.
//!
//! All lifecycle timestamps in LifeLink are Unix epoch milliseconds carried
//! as `u64`. Components that mutate records take the timestamp as an
//! argument so tests can drive time explicitly; the coordinators at the
//! service edge read it from here.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// Saturates to 0 if the system clock reports a time before the epoch
/// rather than panicking inside dispatch paths.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_is_nonzero_and_monotonic_enough() {
        let a = now_ms();
        let b = now_ms();
        assert!(a > 1_600_000_000_000); // after Sep 2020, sanity bound
        assert!(b >= a);
    }
}
