//! Application-level configuration for the realtime synchronization layer.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "CARDROOM_LIVE_CONFIG_PATH";

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Prefix for pub/sub channel names (`"<namespace>:<table_id>"`).
    pub channel_namespace: String,
    /// Bounded wait for the channel subscribe handshake.
    pub subscribe_timeout: Duration,
    /// Delay between chat poll completions.
    pub poll_interval: Duration,
    /// Delay before the first chat poll, letting the connected event flush.
    pub first_poll_delay: Duration,
    /// Consecutive empty polls before a heartbeat is emitted.
    pub heartbeat_after_polls: u32,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded realtime configuration");
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
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            channel_namespace: "table".into(),
            subscribe_timeout: Duration::from_millis(2_000),
            poll_interval: Duration::from_millis(2_000),
            first_poll_delay: Duration::from_millis(500),
            heartbeat_after_polls: 7,
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file. Every field is optional;
/// missing entries keep their built-in default.
struct RawConfig {
    #[serde(default)]
    channel_namespace: Option<String>,
    #[serde(default)]
    subscribe_timeout_ms: Option<u64>,
    #[serde(default)]
    poll_interval_ms: Option<u64>,
    #[serde(default)]
    first_poll_delay_ms: Option<u64>,
    #[serde(default)]
    heartbeat_after_polls: Option<u32>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            channel_namespace: value
                .channel_namespace
                .unwrap_or(defaults.channel_namespace),
            subscribe_timeout: value
                .subscribe_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.subscribe_timeout),
            poll_interval: value
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            first_poll_delay: value
                .first_poll_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.first_poll_delay),
            heartbeat_after_polls: value
                .heartbeat_after_polls
                .unwrap_or(defaults.heartbeat_after_polls),
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
