use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

/// Where price bars come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataMode {
    /// Yahoo Finance chart API.
    Live,
    /// JSON files on disk, see `replay::ReplaySource`.
    Replay,
}

impl std::fmt::Display for DataMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataMode::Live => write!(f, "live"),
            DataMode::Replay => write!(f, "replay"),
        }
    }
}

/// Process-level configuration loaded from environment variables at startup.
/// Analysis parameters and the instrument table live in the TOML file at
/// `analysis_config_path`.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_mode: DataMode,
    pub replay_dir: PathBuf,
    pub analysis_config_path: PathBuf,

    // Notification
    pub webhook_url: Option<String>,
    pub webhook_username: String,

    // Market data
    pub yahoo_base_url: String,
    pub http_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_mode: DataMode::Live,
            replay_dir: PathBuf::from("data/replay"),
            analysis_config_path: PathBuf::from("config/analysis.toml"),
            webhook_url: None,
            webhook_username: "Commodity Watch".to_string(),
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            http_timeout: Duration::from_secs(15),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    /// Loads `.env` if present. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so tests never touch the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let data_mode = match lookup("DATA_MODE").map(|v| v.to_lowercase()) {
            None => defaults.data_mode,
            Some(v) if v == "live" => DataMode::Live,
            Some(v) if v == "replay" => DataMode::Replay,
            Some(other) => {
                return Err(Error::Config(format!(
                    "DATA_MODE must be 'live' or 'replay', got: '{other}'"
                )))
            }
        };

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            None => defaults.http_timeout,
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| {
                    Error::Config(format!(
                        "HTTP_TIMEOUT_SECS must be a whole number, got: '{v}'"
                    ))
                })?,
        };

        let webhook_url = lookup("WEBHOOK_URL").filter(|v| !v.trim().is_empty());

        Ok(Config {
            data_mode,
            replay_dir: lookup("REPLAY_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.replay_dir),
            analysis_config_path: lookup("ANALYSIS_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.analysis_config_path),
            webhook_url,
            webhook_username: lookup("WEBHOOK_USERNAME")
                .unwrap_or(defaults.webhook_username),
            yahoo_base_url: lookup("YAHOO_BASE_URL").unwrap_or(defaults.yahoo_base_url),
            http_timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let cfg = Config::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.data_mode, DataMode::Live);
        assert!(cfg.webhook_url.is_none());
        assert_eq!(cfg.http_timeout, Duration::from_secs(15));
        assert_eq!(cfg.analysis_config_path, PathBuf::from("config/analysis.toml"));
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("DATA_MODE", "Replay"),
            ("REPLAY_DIR", "/tmp/bars"),
            ("WEBHOOK_URL", "https://hooks.example/abc"),
            ("HTTP_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(cfg.data_mode, DataMode::Replay);
        assert_eq!(cfg.replay_dir, PathBuf::from("/tmp/bars"));
        assert_eq!(cfg.webhook_url.as_deref(), Some("https://hooks.example/abc"));
        assert_eq!(cfg.http_timeout, Duration::from_secs(3));
    }

    #[test]
    fn blank_webhook_is_treated_as_unset() {
        let cfg = Config::from_lookup(lookup_from(&[("WEBHOOK_URL", "  ")]))
            .unwrap();
        assert!(cfg.webhook_url.is_none());
    }

    #[test]
    fn bad_values_are_config_errors() {
        let err = Config::from_lookup(lookup_from(&[("DATA_MODE", "paper")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup_from(&[("HTTP_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
