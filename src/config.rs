//! Application-level configuration loading: match timing, rating parameters, seeded tables.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use time::Duration;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TABLE_MATCH_CONFIG_PATH";
/// Environment variable that overrides the admin token from the file.
const ADMIN_TOKEN_ENV: &str = "TABLE_MATCH_ADMIN_TOKEN";

/// Length of a match slot on a table.
pub const MATCH_DURATION: Duration = Duration::minutes(12);
/// Gap left between two consecutive slots.
pub const BUFFER: Duration = Duration::minutes(3);
/// How long before the scheduled start the ready check may open.
pub const READY_WINDOW: Duration = Duration::minutes(3);
/// How long after the scheduled start a ready check is forced into play.
pub const READY_TIMEOUT: Duration = Duration::minutes(5);
/// Earliest lead time of the upcoming-match notice.
pub const NOTIFY_WINDOW_START: Duration = Duration::minutes(3);
/// Latest lead time of the upcoming-match notice.
pub const NOTIFY_WINDOW_END: Duration = Duration::minutes(6);
/// Elo K factor.
pub const ELO_K: f64 = 32.0;
/// Rating given to newly registered teams.
pub const INITIAL_RATING: i32 = 1000;
/// Table created on first start when none exists.
const DEFAULT_TABLE_NAME: &str = "Table 1";

/// Deadlines driving the match lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchTiming {
    pub match_duration: Duration,
    pub buffer: Duration,
    pub ready_window: Duration,
    pub ready_timeout: Duration,
    pub notify_window_start: Duration,
    pub notify_window_end: Duration,
}

impl Default for MatchTiming {
    fn default() -> Self {
        Self {
            match_duration: MATCH_DURATION,
            buffer: BUFFER,
            ready_window: READY_WINDOW,
            ready_timeout: READY_TIMEOUT,
            notify_window_start: NOTIFY_WINDOW_START,
            notify_window_end: NOTIFY_WINDOW_END,
        }
    }
}

/// Elo parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingConfig {
    pub k_factor: f64,
    pub initial_rating: i32,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            k_factor: ELO_K,
            initial_rating: INITIAL_RATING,
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub timing: MatchTiming,
    pub rating: RatingConfig,
    /// Table names seeded into an empty store.
    pub tables: Vec<String>,
    /// Token expected in the `X-Admin-Token` header; admin routes are closed when unset.
    pub admin_token: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        tables = config.tables.len(),
                        "loaded configuration"
                    );
                    config
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
        };

        if let Some(token) = env::var(ADMIN_TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
            config.admin_token = Some(token);
        }
        if config.admin_token.is_none() {
            warn!("no admin token configured; admin routes are disabled");
        }
        config
    }

    /// Parse the JSON representation, applying defaults to omitted keys.
    pub fn from_json(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timing: MatchTiming::default(),
            rating: RatingConfig::default(),
            tables: vec![DEFAULT_TABLE_NAME.to_owned()],
            admin_token: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    match_duration_minutes: Option<i64>,
    buffer_minutes: Option<i64>,
    ready_window_minutes: Option<i64>,
    ready_timeout_minutes: Option<i64>,
    notify_window_start_minutes: Option<i64>,
    notify_window_end_minutes: Option<i64>,
    elo_k: Option<f64>,
    initial_rating: Option<i32>,
    tables: Option<Vec<String>>,
    admin_token: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        let minutes = |raw: Option<i64>, fallback: Duration| {
            raw.filter(|m| *m >= 0)
                .map(Duration::minutes)
                .unwrap_or(fallback)
        };

        let timing = MatchTiming {
            match_duration: minutes(value.match_duration_minutes, MATCH_DURATION),
            buffer: minutes(value.buffer_minutes, BUFFER),
            ready_window: minutes(value.ready_window_minutes, READY_WINDOW),
            ready_timeout: minutes(value.ready_timeout_minutes, READY_TIMEOUT),
            notify_window_start: minutes(value.notify_window_start_minutes, NOTIFY_WINDOW_START),
            notify_window_end: minutes(value.notify_window_end_minutes, NOTIFY_WINDOW_END),
        };

        let tables = value
            .tables
            .map(|names| {
                names
                    .into_iter()
                    .map(|name| name.trim().to_owned())
                    .filter(|name| !name.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|names| !names.is_empty())
            .unwrap_or(defaults.tables);

        Self {
            timing,
            rating: RatingConfig {
                k_factor: value.elo_k.unwrap_or(ELO_K),
                initial_rating: value.initial_rating.unwrap_or(INITIAL_RATING),
            },
            tables,
            admin_token: value.admin_token.filter(|token| !token.is_empty()),
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
    fn empty_object_yields_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.timing, MatchTiming::default());
        assert_eq!(config.rating, RatingConfig::default());
        assert_eq!(config.tables, vec!["Table 1".to_owned()]);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = AppConfig::from_json(
            r#"{
                "match_duration_minutes": 20,
                "buffer_minutes": 5,
                "tables": ["Left", "  ", "Right"],
                "admin_token": "s3cret",
                "elo_k": 16
            }"#,
        )
        .unwrap();

        assert_eq!(config.timing.match_duration, Duration::minutes(20));
        assert_eq!(config.timing.buffer, Duration::minutes(5));
        assert_eq!(config.timing.ready_timeout, READY_TIMEOUT);
        assert_eq!(config.tables, vec!["Left".to_owned(), "Right".to_owned()]);
        assert_eq!(config.admin_token.as_deref(), Some("s3cret"));
        assert_eq!(config.rating.k_factor, 16.0);
    }

    #[test]
    fn negative_durations_fall_back() {
        let config = AppConfig::from_json(r#"{"buffer_minutes": -1}"#).unwrap();
        assert_eq!(config.timing.buffer, BUFFER);
    }
}
