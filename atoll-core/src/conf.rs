//! The config for an Atoll ring

use config::{Config, ConfigError};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

/// Help serde default the virtual node count per node
fn default_virtual_nodes() -> usize {
    3
}

/// The ring settings for Atoll
#[derive(Serialize, Deserialize, Clone)]
pub struct RingSettings {
    /// How many virtual nodes to place on the ring per node
    ///
    /// This is fixed for the life of a ring and must be at least 1.
    #[serde(default = "default_virtual_nodes")]
    pub virtual_nodes: usize,
}

impl Default for RingSettings {
    /// Builds a default ring settings struct
    fn default() -> Self {
        RingSettings {
            virtual_nodes: default_virtual_nodes(),
        }
    }
}

/// The different levels to log tracing info at
#[derive(Serialize, Deserialize, Clone, Default)]
pub enum TraceLevel {
    /// Log everything include high verbosity low priority info
    Trace,
    /// Log low priority debug infomation and up
    Debug,
    /// Log standard priority information and up
    #[default]
    Info,
    /// Log only warning and Errors
    Warn,
    /// Log only errors
    Error,
    /// Do not log anything
    Off,
}

impl TraceLevel {
    /// Convert this [`TraceLevel`] to a [`LevelFilter`]
    pub fn to_filter(&self) -> LevelFilter {
        match self {
            TraceLevel::Trace => LevelFilter::TRACE,
            TraceLevel::Debug => LevelFilter::DEBUG,
            TraceLevel::Info => LevelFilter::INFO,
            TraceLevel::Warn => LevelFilter::WARN,
            TraceLevel::Error => LevelFilter::ERROR,
            TraceLevel::Off => LevelFilter::OFF,
        }
    }
}

/// The tracing settings for Atoll
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct Tracing {
    /// The level to log traces at
    #[serde(default)]
    pub level: TraceLevel,
}

/// The config for running an Atoll ring
#[derive(Serialize, Deserialize, Clone, Default)]
pub struct Conf {
    /// The ring settings to use
    #[serde(default)]
    pub ring: RingSettings,
    /// The tracing settings to use
    #[serde(default)]
    pub tracing: Tracing,
}

impl Conf {
    /// Build a config from our environment and a config file
    ///
    /// # Arguments
    ///
    /// * `path` - The path to the config file to load
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        // build our config sources
        let conf = Config::builder()
            // start with the settings in our config file
            .add_source(config::File::with_name(path).required(false))
            // overlay our env vars on top
            .add_source(config::Environment::with_prefix("atoll"))
            .build()?;
        conf.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let conf = Conf::default();
        assert_eq!(conf.ring.virtual_nodes, 3);
        assert_eq!(conf.tracing.level.to_filter(), LevelFilter::INFO);
    }

    #[test]
    fn missing_files_fall_back_to_defaults() {
        // a missing config file is not required and yields defaults
        let conf = Conf::new("definitely-not-a-real-atoll-conf").unwrap();
        assert_eq!(conf.ring.virtual_nodes, 3);
    }
}
