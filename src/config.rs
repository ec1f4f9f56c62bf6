//! Application-level configuration loading: room codes, hole limits and live update tuning.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCORECARD_BACK_CONFIG_PATH";

const DEFAULT_ROOM_CODE_LENGTH: usize = 5;
const MIN_ROOM_CODE_LENGTH: usize = 3;
const MAX_ROOM_CODE_LENGTH: usize = 12;
const DEFAULT_MAX_HOLES: u32 = 18;
const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 10;
const DEFAULT_SSE_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Length of generated room codes.
    pub room_code_length: usize,
    /// Highest hole number accepted on score submission.
    pub max_holes: u32,
    /// Polling interval advertised to clients that do not use the event stream.
    pub refresh_interval_secs: u64,
    /// Per-room broadcast buffer for the event stream.
    pub sse_capacity: usize,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        room_code_length = app_config.room_code_length,
                        max_holes = app_config.max_holes,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document, filling omitted keys with defaults.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            room_code_length: DEFAULT_ROOM_CODE_LENGTH,
            max_holes: DEFAULT_MAX_HOLES,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            sse_capacity: DEFAULT_SSE_CAPACITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    room_code_length: Option<usize>,
    max_holes: Option<u32>,
    refresh_interval_secs: Option<u64>,
    sse_capacity: Option<usize>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            room_code_length: value
                .room_code_length
                .unwrap_or(defaults.room_code_length)
                .clamp(MIN_ROOM_CODE_LENGTH, MAX_ROOM_CODE_LENGTH),
            max_holes: value.max_holes.filter(|holes| *holes > 0).unwrap_or(defaults.max_holes),
            refresh_interval_secs: value
                .refresh_interval_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.refresh_interval_secs),
            sse_capacity: value
                .sse_capacity
                .filter(|capacity| *capacity > 0)
                .unwrap_or(defaults.sse_capacity),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = AppConfig::from_json(r#"{"max_holes": 9}"#).unwrap();
        assert_eq!(config.max_holes, 9);
        assert_eq!(config.room_code_length, DEFAULT_ROOM_CODE_LENGTH);
        assert_eq!(config.refresh_interval_secs, DEFAULT_REFRESH_INTERVAL_SECS);
    }

    #[test]
    fn out_of_range_values_are_corrected() {
        let config =
            AppConfig::from_json(r#"{"room_code_length": 40, "max_holes": 0, "sse_capacity": 0}"#)
                .unwrap();
        assert_eq!(config.room_code_length, MAX_ROOM_CODE_LENGTH);
        assert_eq!(config.max_holes, DEFAULT_MAX_HOLES);
        assert_eq!(config.sse_capacity, DEFAULT_SSE_CAPACITY);
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(AppConfig::from_json("{not json").is_err());
    }
}
