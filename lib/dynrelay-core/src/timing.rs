//! Elapsed-time helpers.

use quanta::Instant;

/// Returns the number of whole microseconds elapsed between `start` and `end`.
///
/// If `end` is earlier than `start`, zero is returned. Durations too large to fit in a `u64` saturate.
pub fn elapsed_micros(start: Instant, end: Instant) -> u64 {
    u64::try_from(end.saturating_duration_since(start).as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use quanta::Clock;

    use super::*;

    #[test]
    fn measures_mocked_time() {
        let (clock, mock) = Clock::mock();

        let start = clock.now();
        mock.increment(Duration::from_micros(1500));
        let end = clock.now();

        assert_eq!(elapsed_micros(start, end), 1500);
    }

    #[test]
    fn truncates_to_whole_micros() {
        let (clock, mock) = Clock::mock();

        let start = clock.now();
        mock.increment(Duration::from_nanos(2999));
        let end = clock.now();

        assert_eq!(elapsed_micros(start, end), 2);
    }

    #[test]
    fn backwards_is_zero() {
        let (clock, mock) = Clock::mock();

        let start = clock.now();
        mock.increment(Duration::from_millis(3));
        let end = clock.now();

        assert_eq!(elapsed_micros(end, start), 0);
    }
}
