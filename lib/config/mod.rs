use std::env;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::notion_client::{NotionClientConfig, DEFAULT_API_URL, DEFAULT_NOTION_VERSION};
use crate::reconcile::ReconcileConfig;
use crate::store::RetryPolicy;

pub const DEFAULT_ID_PROPERTY: &str = "Ticket ID";
/// Largest page the Notion query endpoint accepts.
pub const MAX_PAGE_SIZE: u32 = 100;
/// Notion's documented average request budget per integration.
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 3;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0} (both NOTION_TOKEN and NOTION_DATABASE_ID are required)")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: String, value: String },

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: String,
        value: u64,
        min: u64,
        max: u64,
    },
}

/// Values supplied on the command line. Anything set here wins over the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub database_id: Option<String>,
    pub id_property: Option<String>,
    pub page_size: Option<u32>,
    pub requests_per_second: Option<u32>,
    pub retry_attempts: Option<u32>,
    pub retry_backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub notion_token: String,
    pub database_id: String,
    /// Default: "Ticket ID"
    pub id_property: String,
    pub api_url: String,
    pub notion_version: String,
    /// Default: 100
    pub page_size: u32,
    /// Default: 3. `None` turns pacing off.
    pub requests_per_second: Option<NonZeroU32>,
    /// Default: 11 (the first attempt plus 10 retries)
    pub retry_attempts: u32,
    /// Default: 500ms
    pub retry_backoff: Duration,
}

impl Config {
    pub fn from_env(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok(), overrides)
    }

    /// Builds the config from an arbitrary variable source, so tests need not touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F, overrides: &ConfigOverrides) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let notion_token = non_empty("NOTION_TOKEN")
            .ok_or_else(|| ConfigError::MissingEnvVar("NOTION_TOKEN".to_string()))?;
        let database_id = overrides
            .database_id
            .clone()
            .or_else(|| non_empty("NOTION_DATABASE_ID"))
            .ok_or_else(|| ConfigError::MissingEnvVar("NOTION_DATABASE_ID".to_string()))?;
        let id_property = overrides
            .id_property
            .clone()
            .or_else(|| non_empty("NOTION_ID_PROP"))
            .unwrap_or_else(|| DEFAULT_ID_PROPERTY.to_string());
        let api_url = non_empty("NOTION_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let notion_version =
            non_empty("NOTION_VERSION").unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string());

        let page_size = match overrides.page_size {
            Some(value) => value,
            None => parse_or("NOTION_PAGE_SIZE", non_empty("NOTION_PAGE_SIZE"), MAX_PAGE_SIZE)?,
        };
        check_range("page size", page_size.into(), 1, MAX_PAGE_SIZE.into())?;

        let rps = match overrides.requests_per_second {
            Some(value) => value,
            None => parse_or(
                "NOTION_RATE_LIMIT_RPS",
                non_empty("NOTION_RATE_LIMIT_RPS"),
                DEFAULT_REQUESTS_PER_SECOND,
            )?,
        };

        let retry_attempts = match overrides.retry_attempts {
            Some(value) => value,
            None => parse_or(
                "NOTION_RETRY_ATTEMPTS",
                non_empty("NOTION_RETRY_ATTEMPTS"),
                RetryPolicy::default().max_attempts,
            )?,
        };
        check_range("retry attempts", retry_attempts.into(), 1, 100)?;

        let default_backoff_ms = RetryPolicy::default().backoff_factor.as_millis() as u64;
        let retry_backoff_ms = match overrides.retry_backoff_ms {
            Some(value) => value,
            None => parse_or(
                "NOTION_RETRY_BACKOFF_MS",
                non_empty("NOTION_RETRY_BACKOFF_MS"),
                default_backoff_ms,
            )?,
        };

        Ok(Self {
            notion_token,
            database_id,
            id_property,
            api_url,
            notion_version,
            page_size,
            requests_per_second: NonZeroU32::new(rps),
            retry_attempts,
            retry_backoff: Duration::from_millis(retry_backoff_ms),
        })
    }

    pub fn notion_client_config(&self) -> NotionClientConfig {
        NotionClientConfig {
            api_url: self.api_url.clone(),
            token: self.notion_token.clone(),
            database_id: self.database_id.clone(),
            notion_version: self.notion_version.clone(),
            requests_per_second: self.requests_per_second,
            request_timeout: Duration::from_secs(60),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_attempts,
            backoff_factor: self.retry_backoff,
            ..RetryPolicy::default()
        }
    }

    pub fn reconcile_config(&self, dry_run: bool) -> ReconcileConfig {
        ReconcileConfig {
            id_property: self.id_property.clone(),
            page_size: Some(self.page_size),
            dry_run,
        }
    }
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
    }
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            name: name.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let config = Config::from_lookup(
            lookup(&[("NOTION_TOKEN", "secret"), ("NOTION_DATABASE_ID", "db")]),
            &ConfigOverrides::default(),
        )
        .expect("minimal config should load");

        assert_eq!(config.id_property, "Ticket ID");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.notion_version, "2021-05-13");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.requests_per_second, NonZeroU32::new(3));
        assert_eq!(config.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn missing_token_is_reported() {
        let err = Config::from_lookup(
            lookup(&[("NOTION_DATABASE_ID", "db")]),
            &ConfigOverrides::default(),
        )
        .expect_err("token is required");

        assert_eq!(err, ConfigError::MissingEnvVar("NOTION_TOKEN".to_string()));
    }

    #[test]
    fn blank_database_id_counts_as_missing() {
        let err = Config::from_lookup(
            lookup(&[("NOTION_TOKEN", "secret"), ("NOTION_DATABASE_ID", "  ")]),
            &ConfigOverrides::default(),
        )
        .expect_err("database id is required");

        assert_eq!(
            err,
            ConfigError::MissingEnvVar("NOTION_DATABASE_ID".to_string())
        );
    }

    #[test]
    fn overrides_win_over_environment() {
        let config = Config::from_lookup(
            lookup(&[
                ("NOTION_TOKEN", "secret"),
                ("NOTION_ID_PROP", "Number"),
                ("NOTION_PAGE_SIZE", "50"),
                ("NOTION_RATE_LIMIT_RPS", "0"),
            ]),
            &ConfigOverrides {
                database_id: Some("from-cli".to_string()),
                id_property: Some("Ticket #".to_string()),
                retry_attempts: Some(2),
                retry_backoff_ms: Some(0),
                ..ConfigOverrides::default()
            },
        )
        .expect("config should load");

        assert_eq!(config.database_id, "from-cli");
        assert_eq!(config.id_property, "Ticket #");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.requests_per_second, None);
        assert_eq!(config.retry_policy().max_attempts, 2);
        assert_eq!(config.retry_policy().backoff_factor, Duration::ZERO);
        assert_eq!(config.reconcile_config(true).page_size, Some(50));
    }

    #[test]
    fn rejects_unparseable_and_out_of_range_values() {
        let base = [("NOTION_TOKEN", "secret"), ("NOTION_DATABASE_ID", "db")];

        let mut vars = base.to_vec();
        vars.push(("NOTION_RETRY_ATTEMPTS", "many"));
        assert_eq!(
            Config::from_lookup(lookup(&vars), &ConfigOverrides::default()),
            Err(ConfigError::InvalidValue {
                name: "NOTION_RETRY_ATTEMPTS".to_string(),
                value: "many".to_string(),
            })
        );

        let mut vars = base.to_vec();
        vars.push(("NOTION_PAGE_SIZE", "500"));
        assert!(matches!(
            Config::from_lookup(lookup(&vars), &ConfigOverrides::default()),
            Err(ConfigError::OutOfRange { value: 500, .. })
        ));
    }
}
