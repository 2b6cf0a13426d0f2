//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;

/// Driver configuration loaded from environment variables
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error), used when RUST_LOG is unset
    pub log_level: String,
    /// Seed for the bot's random source; `None` seeds from entropy
    pub seed: Option<u64>,
    /// Frames simulated per second of match time
    pub frame_rate: u32,
    /// Pace frames against the wall clock instead of fast-forwarding
    pub realtime: bool,
    /// Matches played back to back
    pub max_matches: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            seed: None,
            frame_rate: 60,
            realtime: false,
            max_matches: 1,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let frame_rate = parse_or(&lookup, "FRAME_RATE", defaults.frame_rate)?;
        if !(1..=240).contains(&frame_rate) {
            return Err(ConfigError::Invalid {
                key: "FRAME_RATE",
                value: frame_rate.to_string(),
            });
        }

        let max_matches = parse_or(&lookup, "MAX_MATCHES", defaults.max_matches)?;
        if max_matches == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_MATCHES",
                value: max_matches.to_string(),
            });
        }

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            seed: lookup("MATCH_SEED")
                .map(|raw| parse(&raw, "MATCH_SEED"))
                .transpose()?,
            frame_rate,
            realtime: parse_or(&lookup, "REALTIME", defaults.realtime)?,
            max_matches,
        })
    }
}

fn parse<T: FromStr>(raw: &str, key: &'static str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&'static str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => parse(&raw, key),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}
