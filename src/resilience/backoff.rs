//! Exponential backoff with jitter, and Retry-After parsing.

use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Calculate the delay before the attempt following `attempt` (0-based).
///
/// `base * factor^attempt`, plus up to `jitter * delay` of uniform additive
/// jitter. The un-jittered delay is always the floor. A non-positive base
/// means no sleep at all.
pub fn backoff_delay(attempt: u32, base: f64, factor: f64, jitter: f64) -> Duration {
    if base <= 0.0 || base.is_nan() {
        return Duration::ZERO;
    }

    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let mut delay = base * factor.powi(exponent);

    if jitter > 0.0 && delay.is_finite() {
        delay += rand::thread_rng().gen::<f64>() * jitter * delay;
    }

    seconds_to_duration(delay)
}

/// Read an integer `Retry-After` header, in seconds.
///
/// HTTP-date values, negative numbers, and garbage are treated as absent.
pub fn retry_after_seconds(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?;
    let secs = value.trim().parse::<u64>().ok()?;
    Some(Duration::from_secs(secs))
}

fn seconds_to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_backoff_calculation() {
        assert_eq!(backoff_delay(0, 0.5, 2.0, 0.0), Duration::from_millis(500));
        assert_eq!(backoff_delay(1, 0.5, 2.0, 0.0), Duration::from_secs(1));
        assert_eq!(backoff_delay(3, 0.5, 2.0, 0.0), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_monotonic_without_jitter() {
        let mut previous = backoff_delay(0, 0.1, 1.5, 0.0);
        for attempt in 1..20 {
            let next = backoff_delay(attempt, 0.1, 1.5, 0.0);
            assert!(next > previous, "attempt {} did not grow", attempt);
            previous = next;
        }
    }

    #[test]
    fn test_zero_base_never_sleeps() {
        for attempt in 0..10 {
            assert_eq!(backoff_delay(attempt, 0.0, 2.0, 0.5), Duration::ZERO);
        }
        assert_eq!(backoff_delay(4, -1.0, 2.0, 0.0), Duration::ZERO);
    }

    #[test]
    fn test_jitter_is_additive_and_bounded() {
        for _ in 0..200 {
            let delay = backoff_delay(2, 1.0, 2.0, 0.5).as_secs_f64();
            assert!(delay >= 4.0);
            assert!(delay <= 6.0);
        }
    }

    #[test]
    fn test_huge_exponent_saturates() {
        assert_eq!(backoff_delay(10_000, 1.0, 10.0, 0.0), Duration::MAX);
    }

    #[test]
    fn test_retry_after_integer() {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after_seconds(&headers), Some(Duration::from_secs(7)));

        headers.insert(RETRY_AFTER, HeaderValue::from_static(" 0 "));
        assert_eq!(retry_after_seconds(&headers), Some(Duration::ZERO));
    }

    #[test]
    fn test_retry_after_rejects_dates_and_junk() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after_seconds(&headers), None);

        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after_seconds(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("-3"));
        assert_eq!(retry_after_seconds(&headers), None);

        headers.insert(RETRY_AFTER, HeaderValue::from_static("1.5"));
        assert_eq!(retry_after_seconds(&headers), None);
    }
}
