// ABOUTME: Console configuration loaded from defaults, an optional TOML file and the environment
// ABOUTME: Holds backend endpoints, push-channel timings and the current-user file location

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConsoleError, Result};

pub const CONFIG_ENV: &str = "IMPORT_CONSOLE_CONFIG";
pub const API_URL_ENV: &str = "IMPORT_CONSOLE_API_URL";
pub const WS_URL_ENV: &str = "IMPORT_CONSOLE_WS_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    /// Raw WebSocket leg of the backend's SockJS endpoint.
    pub ws_url: String,
    pub progress_topic: String,
    pub request_timeout_secs: u64,
    pub reconnect_delay_ms: u64,
    pub heartbeat_ms: u64,
    pub poll_interval_secs: u64,
    pub user_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            ws_url: "ws://localhost:8080/ws/websocket".to_string(),
            progress_topic: "/topic/import-progress".to_string(),
            request_timeout_secs: 30,
            reconnect_delay_ms: 5000,
            heartbeat_ms: 4000,
            poll_interval_secs: 5,
            user_file: default_user_file(),
        }
    }
}

fn default_user_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("import-console")
        .join("user.json")
}

impl Config {
    /// Defaults, then the file named by `path` (or `$IMPORT_CONSOLE_CONFIG`), then env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(from_env) {
            Some(file) => Self::from_file(&file)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConsoleError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&raw)
            .map_err(|e| ConsoleError::Config(format!("invalid {}: {}", path.display(), e)))
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            self.api_base_url = url;
        }
        if let Ok(url) = std::env::var(WS_URL_ENV) {
            self.ws_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(ConsoleError::Config(format!(
                "api_base_url must be an http(s) URL, got '{}'",
                self.api_base_url
            )));
        }
        if !self.ws_url.starts_with("ws://") && !self.ws_url.starts_with("wss://") {
            return Err(ConsoleError::Config(format!(
                "ws_url must be a ws(s) URL, got '{}'",
                self.ws_url
            )));
        }
        if self.reconnect_delay_ms == 0 {
            return Err(ConsoleError::Config(
                "reconnect_delay_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}
