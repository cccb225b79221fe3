use std::time::Duration;

/// Multiplier applied to the delay after every retry.
pub const BACKOFF_FACTOR: u32 = 2;

/// Response statuses that are worth another attempt.
///
/// 403 is included because asset CDNs answer with it while a freshly signed
/// URL propagates.
pub const RETRYABLE_STATUS: [u16; 6] = [403, 408, 429, 502, 503, 504];

/// Calculate the delay before a retry attempt using exponential backoff.
///
/// The delay formula is: `base * 2^retry_count`
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use courier_transfer::core::retry_delay;
///
/// // First retry: base * 2^0 = base
/// assert_eq!(retry_delay(0, Duration::from_millis(200)), Duration::from_millis(200));
///
/// // Third retry: base * 2^2 = base * 4
/// assert_eq!(retry_delay(2, Duration::from_millis(200)), Duration::from_millis(800));
/// ```
pub fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    let multiplier = BACKOFF_FACTOR.saturating_pow(retry_count);
    base.saturating_mul(multiplier)
}

pub fn is_retryable_status(status: u16) -> bool { RETRYABLE_STATUS.contains(&status) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_basic() {
        let base = Duration::from_millis(200);

        assert_eq!(retry_delay(0, base), Duration::from_millis(200));
        assert_eq!(retry_delay(1, base), Duration::from_millis(400));
        assert_eq!(retry_delay(2, base), Duration::from_millis(800));
        assert_eq!(retry_delay(3, base), Duration::from_millis(1600));
    }

    #[test]
    fn test_retry_delay_overflow_protection() {
        let base = Duration::from_secs(1);
        assert_eq!(retry_delay(64, base), base.saturating_mul(u32::MAX));
        assert_eq!(retry_delay(1, Duration::MAX), Duration::MAX);
    }

    #[test]
    fn test_retry_delay_zero_base() {
        assert_eq!(retry_delay(5, Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_retryable_status_table() {
        for status in [403, 408, 429, 502, 503, 504] {
            assert!(is_retryable_status(status), "{status} should retry");
        }
        for status in [200, 301, 400, 401, 404, 410, 500, 501] {
            assert!(!is_retryable_status(status), "{status} should not retry");
        }
    }
}
