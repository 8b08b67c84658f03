//! Configuration file support
//!
//! Settings live in a TOML file so the as-of date, input path, rates and
//! webhook target are inputs rather than constants:
//!
//! ```toml
//! csv_path = "eastspring_funds_nav.csv"
//! as_of = "2025-04-04"
//! webhook_url = "https://hooks.slack.com/services/..."
//! timeout_secs = 10
//!
//! [rates]
//! base = "USD"
//! fallback = 1.0
//!
//! [rates.table]
//! USD = 1.00
//! SGD = 0.74
//! ```
//!
//! Lookup order: `--config`, `$NAVWATCH_CONFIG`, then
//! `<config home>/navwatch/config.toml`. Only the last may be absent.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::NavError;
use crate::fx::RateTable;
use crate::importers::nav_csv::parse_nav_date;

pub const CONFIG_ENV: &str = "NAVWATCH_CONFIG";
pub const WEBHOOK_ENV: &str = "NAVWATCH_WEBHOOK_URL";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub csv_path: Option<PathBuf>,
    /// Either a TOML date or a quoted string
    pub as_of: Option<toml::Value>,
    pub webhook_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub rates: RatesConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RatesConfig {
    pub base: Option<String>,
    pub fallback: Option<Decimal>,
    /// Replaces the built-in table entirely when non-empty
    pub table: BTreeMap<String, Decimal>,
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| NavError::Config(e.to_string()).into())
    }

    /// Load from the first config location that applies, then env overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);

        let config = match explicit.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::read(&path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        Ok(config.with_webhook_override(std::env::var(WEBHOOK_ENV).ok()))
    }

    fn read(path: &Path) -> Result<Self> {
        info!("Loading config from {:?}", path);
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn with_webhook_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.webhook_url = Some(url);
        }
        self
    }

    pub fn as_of_date(&self) -> Result<Option<NaiveDate>> {
        let text = match &self.as_of {
            None => return Ok(None),
            Some(toml::Value::String(s)) => s.clone(),
            Some(toml::Value::Datetime(dt)) => dt.to_string(),
            Some(other) => {
                return Err(NavError::Config(format!("as_of must be a date, got {}", other)).into())
            }
        };

        parse_nav_date(&text)
            .map(Some)
            .ok_or_else(|| NavError::Config(format!("invalid as_of date '{}'", text)).into())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Effective rate table: built-in April 2025 rates unless overridden
    pub fn rate_table(&self) -> RateTable {
        let defaults = RateTable::default();
        let rates = if self.rates.table.is_empty() {
            defaults.rates
        } else {
            self.rates.table.clone()
        };

        RateTable::new(
            self.rates.base.as_deref().unwrap_or(&defaults.base),
            rates,
            self.rates.fallback.unwrap_or(defaults.fallback),
        )
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join("navwatch").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert!(config.csv_path.is_none());
        assert_eq!(config.as_of_date().unwrap(), None);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.rate_table(), RateTable::default());
    }

    #[test]
    fn test_full_config() {
        let config = Config::from_toml_str(
            r#"
            csv_path = "navs.csv"
            as_of = "2025-04-04"
            webhook_url = "http://localhost/hook"
            timeout_secs = 3

            [rates]
            base = "sgd"
            fallback = "0"

            [rates.table]
            USD = "1.35"
            SGD = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.csv_path, Some(PathBuf::from("navs.csv")));
        assert_eq!(
            config.as_of_date().unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 4)
        );
        assert_eq!(config.webhook_url.as_deref(), Some("http://localhost/hook"));
        assert_eq!(config.timeout(), Duration::from_secs(3));

        let table = config.rate_table();
        assert_eq!(table.base, "SGD");
        assert_eq!(table.rates.len(), 2);
        assert_eq!(table.rate_for("USD"), dec!(1.35));
        assert_eq!(table.rate_for("EUR"), dec!(0));
    }

    #[test]
    fn test_bare_toml_date_is_accepted() {
        let config = Config::from_toml_str("as_of = 2025-04-04").unwrap();
        assert_eq!(
            config.as_of_date().unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, 4)
        );
    }

    #[test]
    fn test_invalid_as_of_is_an_error() {
        let config = Config::from_toml_str("as_of = \"soon\"").unwrap();
        assert!(config.as_of_date().is_err());

        let config = Config::from_toml_str("as_of = 3").unwrap();
        assert!(config.as_of_date().is_err());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = Config::from_toml_str("webhok_url = \"x\"").unwrap_err();
        assert!(err.to_string().contains("config error"));
    }

    #[test]
    fn test_webhook_override() {
        let config = Config::from_toml_str("webhook_url = \"http://a\"").unwrap();

        let kept = config.clone().with_webhook_override(Some("  ".to_string()));
        assert_eq!(kept.webhook_url.as_deref(), Some("http://a"));

        let replaced = config.with_webhook_override(Some("http://b".to_string()));
        assert_eq!(replaced.webhook_url.as_deref(), Some("http://b"));
    }

    #[test]
    fn test_load_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = 5").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
