//! Service configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::env;

use coupon_core::validation::validate_page_size;

/// Coupon service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// SQLite database file, or `:memory:`
    pub db_path: String,

    /// Maximum pooled connections
    pub db_max_connections: u32,

    /// Months a new coupon stays valid when no expiry date is given
    pub default_validity_months: u32,

    /// Page size used when a listing does not ask for one
    pub default_page_size: u32,

    /// Fixed evaluation date; today's date when unset
    pub evaluation_date: Option<NaiveDate>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            db_path: "./coupons.db".to_string(),
            db_max_connections: 5,
            default_validity_months: 1,
            default_page_size: 10,
            evaluation_date: None,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = ServiceConfig::default();

        let config = ServiceConfig {
            db_path: lookup("COUPON_DB_PATH").unwrap_or(defaults.db_path),

            db_max_connections: parse_or(
                &lookup,
                "COUPON_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,

            default_validity_months: parse_or(
                &lookup,
                "COUPON_DEFAULT_VALIDITY_MONTHS",
                defaults.default_validity_months,
            )?,

            default_page_size: parse_or(
                &lookup,
                "COUPON_DEFAULT_PAGE_SIZE",
                defaults.default_page_size,
            )?,

            evaluation_date: lookup("COUPON_EVALUATION_DATE")
                .map(|raw| {
                    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                        .map_err(|_| ConfigError::InvalidValue("COUPON_EVALUATION_DATE".to_string()))
                })
                .transpose()?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "COUPON_DB_MAX_CONNECTIONS".to_string(),
            ));
        }
        if config.default_validity_months == 0 {
            return Err(ConfigError::InvalidValue(
                "COUPON_DEFAULT_VALIDITY_MONTHS".to_string(),
            ));
        }
        validate_page_size(config.default_page_size)
            .map_err(|_| ConfigError::InvalidValue("COUPON_DEFAULT_PAGE_SIZE".to_string()))?;

        Ok(config)
    }

    /// The date coupons are evaluated against.
    pub fn today(&self) -> NaiveDate {
        self.evaluation_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.default_validity_months, 1);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("COUPON_DB_PATH", ":memory:"),
            ("COUPON_DB_MAX_CONNECTIONS", "3"),
            ("COUPON_DEFAULT_VALIDITY_MONTHS", "6"),
            ("COUPON_DEFAULT_PAGE_SIZE", "25"),
            ("COUPON_EVALUATION_DATE", "2026-05-01"),
        ])
        .unwrap();

        assert_eq!(config.db_path, ":memory:");
        assert_eq!(config.db_max_connections, 3);
        assert_eq!(config.default_validity_months, 6);
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.today(), NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            ("COUPON_DB_MAX_CONNECTIONS", "many"),
            ("COUPON_DB_MAX_CONNECTIONS", "0"),
            ("COUPON_DEFAULT_VALIDITY_MONTHS", "0"),
            ("COUPON_DEFAULT_PAGE_SIZE", "0"),
            ("COUPON_DEFAULT_PAGE_SIZE", "1000"),
            ("COUPON_EVALUATION_DATE", "01/05/2026"),
        ] {
            let err = load(&[(key, value)]).unwrap_err();
            assert!(matches!(&err, ConfigError::InvalidValue(k) if k == key), "{key}={value}");
        }
    }
}
