//! Client configuration.
//!
//! Configuration can be loaded from:
//! - Environment variables (ROOMCHAT_*)
//! - TOML configuration file
//! - Command line arguments (see [`crate::cli`])

use anyhow::{Context, Result};
use clap::ValueEnum;
use roomchat_transport::{
    Endpoint, ServerMode, WebSocketConfig, DEFAULT_LOCAL_ADDR, DEFAULT_REMOTE_URL,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Which server to talk to.
    #[serde(default)]
    pub server: ServerConfig,

    /// Transport configuration.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Log output.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Local development server or the hosted one.
    #[serde(default)]
    pub mode: Mode,

    /// `host:port` of the local server.
    #[serde(default = "default_addr")]
    pub addr: String,

    /// URL of the hosted server.
    #[serde(default = "default_remote_url")]
    pub remote_url: String,
}

/// Server preset as written in config files and on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Plain WebSocket to `addr`.
    #[default]
    Local,
    /// TLS WebSocket to the hosted server.
    #[serde(alias = "render")]
    #[value(alias = "render")]
    Remote,
}

impl From<Mode> for ServerMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Local => ServerMode::Local,
            Mode::Remote => ServerMode::Remote,
        }
    }
}

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Maximum inbound message size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

/// Log output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// File the log is written to. The terminal belongs to the UI.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

// Default value functions
fn default_addr() -> String {
    std::env::var("ROOMCHAT_ADDR").unwrap_or_else(|_| DEFAULT_LOCAL_ADDR.to_string())
}

fn default_remote_url() -> String {
    DEFAULT_REMOTE_URL.to_string()
}

fn default_max_message_size() -> usize {
    64 * 1024 // 64 KB
}

fn default_log_file() -> PathBuf {
    std::env::temp_dir().join("roomchat.log")
}

fn default_log_filter() -> String {
    "roomchat=info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            addr: default_addr(),
            remote_url: default_remote_url(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Load configuration from `explicit`, or the first default path that
    /// exists, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen config file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let config_paths = ["roomchat.toml", "~/.config/roomchat/roomchat.toml"];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        // Fall back to defaults with environment overrides
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// The endpoint selected by `server.mode`.
    #[must_use]
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::from_mode(
            self.server.mode.into(),
            &self.server.addr,
            &self.server.remote_url,
        )
    }

    /// WebSocket settings derived from `transport`.
    #[must_use]
    pub fn websocket(&self) -> WebSocketConfig {
        WebSocketConfig {
            max_message_size: self.transport.max_message_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.mode, Mode::Local);
        assert_eq!(config.transport.max_message_size, 64 * 1024);
        assert_eq!(config.server.remote_url, DEFAULT_REMOTE_URL);
    }

    #[test]
    fn test_local_endpoint() {
        let mut config = Config::default();
        config.server.addr = "example.com:8080".to_string();
        assert_eq!(config.endpoint().url(), "ws://example.com:8080/");
    }

    #[test]
    fn test_remote_endpoint() {
        let mut config = Config::default();
        config.server.mode = Mode::Remote;
        let endpoint = config.endpoint();
        assert_eq!(endpoint.url(), DEFAULT_REMOTE_URL);
        assert!(endpoint.is_secure());
    }

    #[test]
    fn test_config_from_toml() {
        let toml_str = r#"
            [server]
            mode = "render"
            addr = "0.0.0.0:9000"

            [transport]
            max_message_size = 1024

            [log]
            filter = "roomchat=debug"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.mode, Mode::Remote);
        assert_eq!(config.server.addr, "0.0.0.0:9000");
        assert_eq!(config.transport.max_message_size, 1024);
        assert_eq!(config.log.filter, "roomchat=debug");
        assert_eq!(config.websocket().max_message_size, 1024);
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join(format!("roomchat-test-{}.toml", std::process::id()));
        std::fs::write(&path, "[server]\nmode = \"local\"\naddr = \"10.0.0.1:1234\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.endpoint().url(), "ws://10.0.0.1:1234/");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = std::env::temp_dir().join("roomchat-does-not-exist.toml");
        assert!(Config::load(Some(&path)).is_err());
    }
}
