//! Backoff delay calculation.

use std::time::Duration;

use rand::Rng;

/// Fraction of the delay used as the upper bound of the random jitter.
const JITTER_RATIO: f64 = 0.1;

/// Exponential delay before jitter: `min(base * 2^attempt, max)`.
pub fn exponential_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    2u32.checked_pow(attempt)
        .and_then(|factor| base.checked_mul(factor))
        .map_or(max, |delay| delay.min(max))
}

/// Exponential delay plus a uniform jitter in `[0, delay * 0.1)`.
pub fn jittered_delay<R: Rng + ?Sized>(
    attempt: u32,
    base: Duration,
    max: Duration,
    rng: &mut R,
) -> Duration {
    let delay = exponential_delay(attempt, base, max);
    let span = delay.as_secs_f64() * JITTER_RATIO;
    if span <= 0.0 {
        return delay;
    }
    delay + Duration::from_secs_f64(rng.gen_range(0.0..span))
}

/// Linear rate-limit wait: `wait * rate_limit_retries`.
pub fn rate_limit_delay(wait: Duration, rate_limit_retries: u32) -> Duration {
    wait.saturating_mul(rate_limit_retries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_exponential_growth() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(10);

        assert_eq!(exponential_delay(0, base, max), Duration::from_secs(1));
        assert_eq!(exponential_delay(1, base, max), Duration::from_secs(2));
        assert_eq!(exponential_delay(2, base, max), Duration::from_secs(4));
        assert_eq!(exponential_delay(3, base, max), Duration::from_secs(8));
    }

    #[test]
    fn test_exponential_capped() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(10);

        assert_eq!(exponential_delay(4, base, max), max);
        assert_eq!(exponential_delay(40, base, max), max);
    }

    #[test]
    fn test_jitter_within_ten_percent() {
        let mut rng = StdRng::seed_from_u64(7);
        let base = Duration::from_millis(500);
        let max = Duration::from_secs(10);

        for attempt in 0..8 {
            let floor = exponential_delay(attempt, base, max);
            let ceiling = floor.mul_f64(1.1);
            for _ in 0..200 {
                let delay = jittered_delay(attempt, base, max, &mut rng);
                assert!(delay >= floor, "attempt {attempt}: {delay:?} < {floor:?}");
                assert!(delay <= ceiling, "attempt {attempt}: {delay:?} > {ceiling:?}");
            }
        }
    }

    #[test]
    fn test_zero_delay_has_no_jitter() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            jittered_delay(3, Duration::ZERO, Duration::ZERO, &mut rng),
            Duration::ZERO
        );
    }

    #[test]
    fn test_rate_limit_delay_is_linear() {
        let wait = Duration::from_secs(5);
        assert_eq!(rate_limit_delay(wait, 1), Duration::from_secs(5));
        assert_eq!(rate_limit_delay(wait, 2), Duration::from_secs(10));
        assert_eq!(rate_limit_delay(wait, 3), Duration::from_secs(15));
    }
}
