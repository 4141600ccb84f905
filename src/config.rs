//! Configuration management for Pacer-Oxide

use crate::limits::QuotaLimits;
use crate::stealth::MouseMotionConfig;
use crate::timing::{BusinessWindow, DelayProfile};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Behavior toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StealthConfig {
    /// Pointer motion options
    pub mouse_movement: MouseMotionConfig,

    /// Allow unsolicited scrolls between actions
    pub random_scrolling: bool,

    /// Only admit actions inside the business window
    pub business_hours_only: bool,

    /// Weekday hours considered open
    pub business_window: BusinessWindow,
}

impl Default for StealthConfig {
    fn default() -> Self {
        Self {
            mouse_movement: MouseMotionConfig::default(),
            random_scrolling: true,
            business_hours_only: false,
            business_window: BusinessWindow::default(),
        }
    }
}

/// Counter database location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "automation.db".to_string(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Daily and hourly quotas
    pub limits: QuotaLimits,

    /// Delay and typing bounds
    pub timing: DelayProfile,

    /// Behavior toggles
    pub stealth: StealthConfig,

    /// Counter database
    pub database: DatabaseConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Layered load: defaults, then `path` when it exists, then `PACER_*`
    /// variables. The result is validated.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.as_ref()).required(false));
        }

        let mut config: Config = builder.build()?.try_deserialize()?;
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `PACER_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("PACER_DAILY_CONNECTIONS") {
            self.limits.daily_connections = parse("PACER_DAILY_CONNECTIONS", &v)?;
        }

        if let Some(v) = lookup("PACER_DAILY_MESSAGES") {
            self.limits.daily_messages = parse("PACER_DAILY_MESSAGES", &v)?;
        }

        if let Some(v) = lookup("PACER_HOURLY_CONNECTIONS") {
            self.limits.hourly_connections = Some(parse("PACER_HOURLY_CONNECTIONS", &v)?);
        }

        if let Some(v) = lookup("PACER_HOURLY_MESSAGES") {
            self.limits.hourly_messages = Some(parse("PACER_HOURLY_MESSAGES", &v)?);
        }

        if let Some(v) = lookup("PACER_BETWEEN_ACTIONS") {
            self.timing.between_actions_secs = parse("PACER_BETWEEN_ACTIONS", &v)?;
        }

        if let Some(v) = lookup("PACER_BUSINESS_HOURS_ONLY") {
            self.stealth.business_hours_only = parse("PACER_BUSINESS_HOURS_ONLY", &v)?;
        }

        if let Some(v) = lookup("PACER_RANDOM_SCROLLING") {
            self.stealth.random_scrolling = parse("PACER_RANDOM_SCROLLING", &v)?;
        }

        if let Some(v) = lookup("PACER_MOUSE_MOVEMENT") {
            self.stealth.mouse_movement.enabled = parse("PACER_MOUSE_MOVEMENT", &v)?;
        }

        if let Some(v) = lookup("PACER_DB_PATH") {
            self.database.path = v;
        }

        Ok(())
    }

    /// Reject inverted bounds, zero limits and out-of-range variance
    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        self.limits.validate()?;
        self.stealth.mouse_movement.validate()?;
        BusinessWindow::new(
            self.stealth.business_window.open_hour,
            self.stealth.business_window.close_hour,
        )?;
        if self.database.path.trim().is_empty() {
            return Err(Error::configuration("database path must not be empty"));
        }
        Ok(())
    }

    pub fn delay_profile(&self) -> DelayProfile {
        self.timing.clone()
    }

    pub fn motion(&self) -> MouseMotionConfig {
        self.stealth.mouse_movement.clone()
    }

    pub fn quota_limits(&self) -> QuotaLimits {
        self.limits.clone()
    }

    pub fn business_window(&self) -> BusinessWindow {
        self.stealth.business_window
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::configuration(format!("Invalid {}", key)))
}
