use almanac_core::config::ExpansionConfig;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Config {
    /// IANA timezone used to decide what "today" is
    pub timezone: String,
    /// Days shown by `agenda` when no end date is given
    pub lookahead_days: u32,
    pub expansion: ExpansionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: detect_system_timezone(),
            lookahead_days: 7,
            expansion: ExpansionConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("ALMANAC_").split("__"))
            .extract()
    }

    pub fn tz(&self) -> Result<Tz, String> {
        validate_timezone(&self.timezone)
    }

    /// The current instant in the configured timezone.
    pub fn now(&self) -> Result<DateTime<Tz>, String> {
        Ok(Utc::now().with_timezone(&self.tz()?))
    }
}

/// Validates that a timezone string is a valid IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<Tz, String> {
    Tz::from_str(timezone).map_err(|_| {
        format!(
            "Invalid timezone: '{}'. Use IANA timezone names like 'America/New_York'",
            timezone
        )
    })
}

/// First valid zone name from `$TZ`, `/etc/timezone` or the OS, else UTC.
pub fn detect_system_timezone() -> String {
    let candidates = [
        std::env::var("TZ").ok(),
        std::fs::read_to_string("/etc/timezone")
            .ok()
            .map(|name| name.trim().to_string()),
        iana_time_zone::get_timezone().ok(),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|name| validate_timezone(name).is_ok())
        .unwrap_or_else(|| "UTC".to_string())
}
