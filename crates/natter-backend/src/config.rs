//! Backend endpoint configuration

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Where the chat backend lives and how to authenticate against it.
///
/// Values come from three layers, later ones winning: hardcoded local
/// defaults, an optional TOML config file, and environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base chat endpoint (non-streaming).
    pub backend_url: String,
    /// Streaming chat endpoint.
    pub stream_url: String,
    /// Bearer token sent in the Authorization header.
    pub auth_token: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3001/chat".to_string(),
            stream_url: "http://localhost:3001/chat/stream".to_string(),
            auth_token: None,
        }
    }
}

impl BackendConfig {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("natter")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for NATTER_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("NATTER_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file and environment
    pub fn load() -> Self {
        let path = Self::config_path();
        let mut config = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(content) => Self::from_toml(&content),
                Err(err) => {
                    tracing::warn!(%err, "failed to read config file, using defaults");
                    Self::default()
                }
            }
        } else {
            Self::default()
        };
        config.apply_env();
        config
    }

    /// Parse a TOML config, falling back to defaults on a parse error.
    fn from_toml(content: &str) -> Self {
        match toml::from_str(content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(%err, "failed to parse config file, using defaults");
                Self::default()
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("NATTER_BACKEND_URL") {
            self.backend_url = url;
        }
        if let Ok(url) = std::env::var("NATTER_STREAM_URL") {
            self.stream_url = url;
        }
        if let Ok(token) = std::env::var("NATTER_AUTH_TOKEN") {
            self.auth_token = Some(token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_local_backend() {
        let config = BackendConfig::default();
        assert_eq!(config.backend_url, "http://localhost:3001/chat");
        assert_eq!(config.stream_url, "http://localhost:3001/chat/stream");
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn test_from_toml_full() {
        let config = BackendConfig::from_toml(
            r#"
            backend_url = "https://chat.example/api"
            stream_url = "https://chat.example/api/stream"
            auth_token = "sk-test"
            "#,
        );
        assert_eq!(config.backend_url, "https://chat.example/api");
        assert_eq!(config.stream_url, "https://chat.example/api/stream");
        assert_eq!(config.auth_token.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_from_toml_partial_keeps_defaults() {
        let config = BackendConfig::from_toml(r#"stream_url = "https://chat.example/stream""#);
        assert_eq!(config.stream_url, "https://chat.example/stream");
        assert_eq!(config.backend_url, "http://localhost:3001/chat");
    }

    #[test]
    fn test_from_toml_invalid_falls_back() {
        let config = BackendConfig::from_toml("stream_url = [not toml");
        assert_eq!(config.stream_url, BackendConfig::default().stream_url);
    }
}
