use std::time::Duration;

use crate::data::{Response, RetryConfig};
use crate::error::Error;

/// What one attempt produced, as seen by the retry loop.
#[derive(Debug)]
pub enum Outcome {
    /// Final response; stop and resolve.
    Success(Response),
    /// Attempt failed but another attempt is allowed.
    RetryableFailure(Failure),
    /// Attempt failed and no attempts remain.
    FatalFailure(Error),
}

#[derive(Debug)]
pub enum Failure {
    /// A response whose status is configured for retry.
    Status(Response),
    /// A transport or cache store error.
    Error(Error),
}

/// Pure retry decisions derived from a [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryScheduler {
    config: RetryConfig,
}

impl RetryScheduler {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts()
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.config.retry_on_status_codes.contains(&status)
    }

    /// `attempt` is 1-based; attempt `retries + 1` is the last one.
    pub fn should_retry(&self, attempt: u32, status: u16) -> bool {
        attempt <= self.config.retries && self.is_retryable_status(status)
    }

    /// Transport and cache store failures ignore the status list.
    pub fn should_retry_error(&self, attempt: u32) -> bool {
        attempt <= self.config.retries
    }

    /// Delay to wait after failed attempt `attempt` (1-based).
    ///
    /// The delay formula is: `min(max_timeout, min_timeout * factor^(attempt - 1))`
    ///
    /// `factor^0` is always 1, so the first retry waits `min_timeout` for
    /// any factor, including zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use fetchplus::{RetryConfig, RetryScheduler};
    ///
    /// let scheduler = RetryScheduler::new(
    ///     RetryConfig::default().min_timeout(Duration::from_millis(100)),
    /// );
    ///
    /// assert_eq!(scheduler.backoff_delay(1), Duration::from_millis(100));
    /// assert_eq!(scheduler.backoff_delay(2), Duration::from_millis(200));
    /// assert_eq!(scheduler.backoff_delay(3), Duration::from_millis(400));
    /// ```
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let multiplier = self.config.factor.powi(exponent);
        let ceiling = self.config.max_timeout.unwrap_or(Duration::MAX);

        let millis = self.config.min_timeout.as_secs_f64() * 1000.0 * multiplier;
        if !millis.is_finite() || millis >= ceiling.as_secs_f64() * 1000.0 {
            return ceiling;
        }
        Duration::from_millis(millis.round() as u64).min(ceiling)
    }

    /// Turn an attempt result into the loop's next move.
    pub fn classify(&self, attempt: u32, result: Result<Response, Error>) -> Outcome {
        match result {
            Ok(response) if self.should_retry(attempt, response.status) => {
                Outcome::RetryableFailure(Failure::Status(response))
            }
            Ok(response) => Outcome::Success(response),
            Err(err) if self.should_retry_error(attempt) => {
                Outcome::RetryableFailure(Failure::Error(err))
            }
            Err(err) => Outcome::FatalFailure(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler(config: RetryConfig) -> RetryScheduler {
        RetryScheduler::new(config)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_backoff_basic() {
        let s = scheduler(RetryConfig::default().min_timeout(ms(100)));

        assert_eq!(s.backoff_delay(1), ms(100));
        assert_eq!(s.backoff_delay(2), ms(200));
        assert_eq!(s.backoff_delay(3), ms(400));
        assert_eq!(s.backoff_delay(4), ms(800));
    }

    #[test]
    fn test_backoff_zero_factor() {
        let s = scheduler(RetryConfig::default().factor(0.0).min_timeout(ms(1)));

        // First retry still waits min_timeout, later ones collapse to zero
        assert_eq!(s.backoff_delay(1), ms(1));
        assert_eq!(s.backoff_delay(2), ms(0));
        assert_eq!(s.backoff_delay(10), ms(0));
    }

    #[test]
    fn test_backoff_fractional_factor() {
        let s = scheduler(RetryConfig::default().factor(1.5).min_timeout(ms(1000)));

        assert_eq!(s.backoff_delay(1), ms(1000));
        assert_eq!(s.backoff_delay(2), ms(1500));
        assert_eq!(s.backoff_delay(3), ms(2250));
    }

    #[test]
    fn test_backoff_capped_by_max_timeout() {
        let s = scheduler(
            RetryConfig::default()
                .min_timeout(ms(100))
                .max_timeout(Some(ms(250))),
        );

        assert_eq!(s.backoff_delay(1), ms(100));
        assert_eq!(s.backoff_delay(2), ms(200));
        assert_eq!(s.backoff_delay(3), ms(250));
        assert_eq!(s.backoff_delay(30), ms(250));
    }

    #[test]
    fn test_backoff_overflow_protection() {
        let s = scheduler(RetryConfig::default().min_timeout(Duration::from_secs(u64::MAX / 2)));

        // Unbounded max_timeout saturates instead of panicking
        assert_eq!(s.backoff_delay(1_000), Duration::MAX);
        assert_eq!(s.backoff_delay(u32::MAX), Duration::MAX);
    }

    #[test]
    fn test_should_retry_status() {
        let s = scheduler(RetryConfig::default());

        assert!(s.should_retry(1, 500));
        assert!(s.should_retry(2, 503));
        assert!(!s.should_retry(3, 503));
        assert!(!s.should_retry(1, 404));
        assert!(!s.should_retry(1, 200));
    }

    #[test]
    fn test_custom_status_codes() {
        let s = scheduler(RetryConfig::default().retry_on_status_codes([418]));

        assert!(s.is_retryable_status(418));
        assert!(!s.is_retryable_status(500));
    }

    #[test]
    fn test_disabled_never_retries() {
        let s = scheduler(RetryConfig::disabled());

        assert_eq!(s.max_attempts(), 1);
        assert!(!s.should_retry(1, 503));
        assert!(!s.should_retry_error(1));
    }

    #[test]
    fn test_classify() {
        let s = scheduler(RetryConfig::default().retries(1));
        let res = |status| Response::new(status, "http://test.com/");

        assert!(matches!(s.classify(1, Ok(res(200))), Outcome::Success(_)));
        assert!(matches!(
            s.classify(1, Ok(res(502))),
            Outcome::RetryableFailure(Failure::Status(_))
        ));
        assert!(matches!(s.classify(2, Ok(res(502))), Outcome::Success(r) if r.status == 502));
        assert!(matches!(
            s.classify(1, Err(Error::transport("reset"))),
            Outcome::RetryableFailure(Failure::Error(_))
        ));
        assert!(matches!(
            s.classify(2, Err(Error::transport("reset"))),
            Outcome::FatalFailure(_)
        ));
    }
}
