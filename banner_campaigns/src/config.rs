//! Application configuration: TOML parsing, defaults and environment overrides.
//!
//! ```toml
//! database_url = "campaigns.db"
//! timezone = "Europe/Moscow"
//!
//! [logging]
//! filter = "banner_campaigns=debug"
//! ```
//!
//! Every key is optional. Entrypoints: [`load_config_str`], [`load_config_path`].

use anyhow::Context;
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shared_utils::env::{get_env_var_opt, parse_env_var};

use crate::dates::today_in;

/// Overrides [`AppConfig::database_url`].
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";
/// Pins the reference date (`YYYY-MM-DD`).
pub const TODAY_VAR: &str = "CAMPAIGNS_TODAY";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct AppConfig {
    /// SQLite database path or URL.
    pub database_url: String,
    /// IANA zone in which "today" is taken from the system clock.
    pub timezone: String,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// `[logging]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "campaigns.db".to_string(),
            timezone: "UTC".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "banner_campaigns=info".to_string(),
        }
    }
}

impl AppConfig {
    /// Parsed [`AppConfig::timezone`].
    pub fn timezone(&self) -> anyhow::Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid timezone {:?}", self.timezone))
    }

    /// Current calendar date in the configured zone.
    pub fn today(&self) -> anyhow::Result<NaiveDate> {
        Ok(today_in(self.timezone()?))
    }

    /// Apply `DATABASE_URL` if it is set.
    pub fn apply_env(&mut self) {
        if let Some(url) = get_env_var_opt(DATABASE_URL_VAR) {
            tracing::debug!(%url, "database url taken from environment");
            self.database_url = url;
        }
    }
}

/// Reference date pinned through `CAMPAIGNS_TODAY`, if any.
pub fn env_today() -> anyhow::Result<Option<NaiveDate>> {
    Ok(parse_env_var::<NaiveDate>(TODAY_VAR)?)
}

/// Parse a config from TOML text and check the timezone.
pub fn load_config_str(toml_str: &str) -> anyhow::Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(toml_str).context("failed to parse config TOML")?;
    cfg.timezone()?;
    Ok(cfg)
}

/// Read and parse a config file.
pub fn load_config_path(path: impl AsRef<std::path::Path>) -> anyhow::Result<AppConfig> {
    let text = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("read config file {}", path.as_ref().display()))?;
    load_config_str(&text)
}
