//! Configuration file structures for roadwatch.
//!
//! The configuration is a YAML file merged with environment variables prefixed
//! with `ROADWATCH_`, nested keys being separated by `__`
//! (e.g. `ROADWATCH_REFRESH__INTERVAL=60`).
//!
//! # Configuration File Format
//!
//! Every section and key is optional, missing values use the defaults below.
//!
//! ```yaml
//! # Open511 events server
//! open511:
//!   url: "https://api.open511.gov.bc.ca"
//!   # Seconds an aggregated result is reused for the same highways
//!   cache_ttl: 180
//!   # Highway requests in flight, 1 means one after the other
//!   max_concurrent_fetches: 1
//!
//! # Open-Meteo forecast server
//! weather:
//!   url: "https://api.open-meteo.com"
//!
//! refresh:
//!   # Seconds between two refresh passes
//!   interval: 300
//!   # Seconds a closure notification stays displayed
//!   notification_timeout: 8
//!
//! # What the user watches
//! settings:
//!   cities:
//!     - name: "Vancouver"
//!       lat: 49.2827
//!       lon: -123.1207
//!   highways:
//!     - "Highway 5"
//!     - "Highway 97D"
//!   # Local hours of the period forecasts
//!   forecast_hours:
//!     morning: 8
//!     afternoon: 14
//!     evening: 19
//! ```

use std::path::Path;

use anyhow::{Context, bail};
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::Deserialize;

use crate::alerts::DEFAULT_NOTIFICATION_TIMEOUT_SECS;

/// Prefix of the environment variables overriding the file.
const ENV_PREFIX: &str = "ROADWATCH_";

/// Root configuration structure.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Open511 server configuration
    pub open511: Open511,
    /// Weather server configuration
    pub weather: Weather,
    /// Refresh cadence
    pub refresh: Refresh,
    /// Watched cities and highways
    pub settings: UserSettings,
}

/// Open511 events server configuration.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Open511 {
    /// Base URL of the Open511 server.
    ///
    /// Trailing slashes are removed on load.
    pub url: String,

    /// Time-to-live in seconds of the aggregated events.
    pub cache_ttl: u64,

    /// Maximum number of highway requests in flight.
    ///
    /// The merge order does not depend on it.
    pub max_concurrent_fetches: usize,
}

impl Default for Open511 {
    fn default() -> Self {
        Open511 {
            url: "https://api.open511.gov.bc.ca".to_string(),
            cache_ttl: 180,
            max_concurrent_fetches: 1,
        }
    }
}

/// Weather server configuration.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Weather {
    /// Base URL of the Open-Meteo server.
    pub url: String,
}

impl Default for Weather {
    fn default() -> Self {
        Weather {
            url: "https://api.open-meteo.com".to_string(),
        }
    }
}

/// Refresh configuration.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Refresh {
    /// Seconds between two refresh passes.
    pub interval: u64,

    /// Seconds a notification stays displayed unless dismissed.
    pub notification_timeout: u64,
}

impl Default for Refresh {
    fn default() -> Self {
        Refresh {
            interval: 300,
            notification_timeout: DEFAULT_NOTIFICATION_TIMEOUT_SECS,
        }
    }
}

/// A city whose weather is displayed.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Hours of the day the period forecasts are shown for.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct ForecastHours {
    pub morning: u8,
    pub afternoon: u8,
    pub evening: u8,
}

impl Default for ForecastHours {
    fn default() -> Self {
        ForecastHours {
            morning: 8,
            afternoon: 14,
            evening: 19,
        }
    }
}

impl ForecastHours {
    /// Returns each period name with its hour, morning first.
    pub fn periods(&self) -> [(&'static str, u8); 3] {
        [
            ("morning", self.morning),
            ("afternoon", self.afternoon),
            ("evening", self.evening),
        ]
    }
}

/// User selected cities and highways.
///
/// A change of these settings triggers an immediate refresh.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UserSettings {
    /// Cities to fetch the weather of, in display order
    pub cities: Vec<City>,
    /// Highway ids to fetch the events of, in display order
    pub highways: Vec<String>,
    /// Hours of the period forecasts
    pub forecast_hours: ForecastHours,
}

impl Default for UserSettings {
    fn default() -> Self {
        UserSettings {
            cities: vec![City {
                name: "Vancouver".to_string(),
                lat: 49.2827,
                lon: -123.1207,
            }],
            highways: vec!["Highway 5".to_string(), "Highway 97D".to_string()],
            forecast_hours: ForecastHours::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a YAML file and the environment.
    ///
    /// # Errors
    ///
    /// Fails if the file does not exist, is not valid YAML, or a value has the
    /// wrong type.
    pub fn load(path: &str) -> anyhow::Result<Config> {
        if !Path::new(path).is_file() {
            bail!("configuration file {} not found", path);
        }

        let mut config: Config = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("invalid configuration in {}", path))?;

        config.normalize();

        Ok(config)
    }

    /// Removes the trailing slashes of the server URLs.
    fn normalize(&mut self) {
        let trimmed = self.open511.url.trim_end_matches('/').len();
        self.open511.url.truncate(trimmed);

        let trimmed = self.weather.url.trim_end_matches('/').len();
        self.weather.url.truncate(trimmed);
    }
}
