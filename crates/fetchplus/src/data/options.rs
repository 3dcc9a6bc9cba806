use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Statuses retried when no explicit set is configured.
pub const DEFAULT_RETRY_STATUS_CODES: [u16; 5] = [408, 500, 502, 503, 504];

/// Retry and backoff configuration.
///
/// Every field has a named default; setters override one field at a time,
/// so a partially specified configuration is always merged field-by-field.
///
/// - `retries`: retries after the first attempt (total attempts = `retries + 1`)
/// - `factor`: exponential growth of the backoff delay
/// - `min_timeout`: delay before the first retry
/// - `max_timeout`: upper bound on any delay, `None` for unbounded
/// - `retry_on_status_codes`: statuses that trigger a retry
///
/// Transport failures are retried regardless of `retry_on_status_codes`.
///
/// # Examples
///
/// ```
/// use fetchplus::RetryConfig;
/// use std::time::Duration;
///
/// let config = RetryConfig::default()
///     .retries(5)
///     .factor(1.5)
///     .min_timeout(Duration::from_millis(200))
///     .retry_on_status_codes([429, 503]);
/// assert_eq!(config.max_attempts(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub retries: u32,
    pub factor: f64,
    #[serde(rename = "min_timeout_ms", with = "millis")]
    pub min_timeout: Duration,
    #[serde(rename = "max_timeout_ms", with = "opt_millis")]
    pub max_timeout: Option<Duration>,
    pub retry_on_status_codes: BTreeSet<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 2,
            factor: 2.0,
            min_timeout: Duration::from_millis(1000),
            max_timeout: None,
            retry_on_status_codes: DEFAULT_RETRY_STATUS_CODES.into_iter().collect(),
        }
    }
}

impl RetryConfig {
    /// A single attempt with no retries.
    ///
    /// This is what "retry disabled" and "zero retries" both mean.
    pub fn disabled() -> Self {
        Self {
            retries: 0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    #[must_use]
    pub fn factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    #[must_use]
    pub fn min_timeout(mut self, min_timeout: Duration) -> Self {
        self.min_timeout = min_timeout;
        self
    }

    #[must_use]
    pub fn max_timeout(mut self, max_timeout: Option<Duration>) -> Self {
        self.max_timeout = max_timeout;
        self
    }

    #[must_use]
    pub fn retry_on_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retry_on_status_codes = codes.into_iter().collect();
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Check invariants once, at client construction.
    pub fn validate(&self) -> Result<()> {
        if !self.factor.is_finite() || self.factor < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "retry factor must be a finite number >= 0, got {}",
                self.factor
            )));
        }
        if let Some(max) = self.max_timeout
            && max < self.min_timeout
        {
            return Err(Error::InvalidConfig(format!(
                "max_timeout ({max:?}) is shorter than min_timeout ({:?})",
                self.min_timeout
            )));
        }
        if let Some(code) = self
            .retry_on_status_codes
            .iter()
            .find(|code| !(100..=599).contains(*code))
        {
            return Err(Error::InvalidConfig(format!(
                "{code} is not an HTTP status code"
            )));
        }
        Ok(())
    }
}

/// Client configuration as loaded from a TOML or JSON file.
///
/// `retry` accepts `false` (no retry), `true` (defaults) or a table whose
/// missing keys take their defaults:
///
/// ```
/// use fetchplus::ClientConfig;
///
/// let config = ClientConfig::from_toml_str(
///     r#"
///     [retry]
///     retries = 4
///     min_timeout_ms = 250
///     "#,
/// )
/// .unwrap();
/// let retry = config.retry_config();
/// assert_eq!(retry.retries, 4);
/// assert_eq!(retry.factor, 2.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ClientConfig {
    #[serde(default, deserialize_with = "deserialize_retry")]
    pub retry: Option<RetryConfig>,
}

impl ClientConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Effective retry configuration; absent means disabled.
    pub fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_else(RetryConfig::disabled)
    }
}

fn deserialize_retry<'de, D>(deserializer: D) -> std::result::Result<Option<RetryConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RetrySetting {
        Flag(bool),
        Config(RetryConfig),
    }

    Ok(match RetrySetting::deserialize(deserializer)? {
        RetrySetting::Flag(false) => None,
        RetrySetting::Flag(true) => Some(RetryConfig::default()),
        RetrySetting::Config(config) => Some(config),
    })
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().try_into().unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

mod opt_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|ms| ms.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.retries, 2);
        assert_eq!(config.factor, 2.0);
        assert_eq!(config.min_timeout, Duration::from_secs(1));
        assert_eq!(config.max_timeout, None);
        assert_eq!(
            config.retry_on_status_codes.iter().copied().collect::<Vec<_>>(),
            vec![408, 500, 502, 503, 504]
        );
    }

    #[test]
    fn disabled_and_zero_retries_are_the_same() {
        assert_eq!(RetryConfig::disabled(), RetryConfig::default().retries(0));
        assert_eq!(RetryConfig::disabled().max_attempts(), 1);
    }

    #[test]
    fn setters_override_single_fields() {
        let config = RetryConfig::default().factor(0.0).min_timeout(Duration::from_millis(1));
        assert_eq!(config.factor, 0.0);
        assert_eq!(config.min_timeout, Duration::from_millis(1));
        assert_eq!(config.retries, 2);
        assert!(config.retry_on_status_codes.contains(&503));
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(RetryConfig::default().validate().is_ok());
        assert!(RetryConfig::default().factor(-1.0).validate().is_err());
        assert!(RetryConfig::default().factor(f64::NAN).validate().is_err());
        assert!(
            RetryConfig::default()
                .max_timeout(Some(Duration::from_millis(10)))
                .validate()
                .is_err()
        );
        assert!(
            RetryConfig::default()
                .retry_on_status_codes([42])
                .validate()
                .is_err()
        );
    }

    #[test]
    fn toml_retry_false() {
        let config = ClientConfig::from_toml_str("retry = false").unwrap();
        assert_eq!(config.retry, None);
        assert_eq!(config.retry_config(), RetryConfig::disabled());
    }

    #[test]
    fn toml_retry_true() {
        let config = ClientConfig::from_toml_str("retry = true").unwrap();
        assert_eq!(config.retry, Some(RetryConfig::default()));
    }

    #[test]
    fn toml_missing_retry() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config.retry_config().retries, 0);
    }

    #[test]
    fn toml_partial_table() {
        let config = ClientConfig::from_toml_str(
            r#"
            [retry]
            factor = 0.0
            max_timeout_ms = 5000
            retry_on_status_codes = [418]
            "#,
        )
        .unwrap();

        let retry = config.retry_config();
        assert_eq!(retry.retries, 2);
        assert_eq!(retry.factor, 0.0);
        assert_eq!(retry.min_timeout, Duration::from_millis(1000));
        assert_eq!(retry.max_timeout, Some(Duration::from_secs(5)));
        assert_eq!(retry.retry_on_status_codes.len(), 1);
    }

    #[test]
    fn toml_invalid() {
        assert!(matches!(
            ClientConfig::from_toml_str("retry = 3"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn json_retry_flags() {
        let config = ClientConfig::from_json_str(r#"{"retry": false}"#).unwrap();
        assert_eq!(config.retry, None);
        assert_eq!(config.retry_config(), RetryConfig::disabled());

        let config = ClientConfig::from_json_str(r#"{"retry": true}"#).unwrap();
        assert_eq!(config.retry, Some(RetryConfig::default()));

        let config = ClientConfig::from_json_str("{}").unwrap();
        assert_eq!(config.retry, None);
    }

    #[test]
    fn json_partial_object() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"retry": {"retries": 1, "max_timeout_ms": 5000, "retry_on_status_codes": [429]}}"#,
        )
        .unwrap();
        let retry = config.retry_config();
        assert_eq!(retry.retries, 1);
        assert_eq!(retry.factor, 2.0);
        assert_eq!(retry.min_timeout, Duration::from_millis(1000));
        assert_eq!(retry.max_timeout, Some(Duration::from_secs(5)));
        assert_eq!(retry.retry_on_status_codes, [429].into_iter().collect());
    }

    #[test]
    fn json_invalid() {
        assert!(matches!(
            ClientConfig::from_json_str(r#"{"retry": "often"}"#),
            Err(Error::Json(_))
        ));
    }
}
