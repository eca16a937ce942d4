use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::time::Duration;

/// Environment variable that overrides the configured server URL
pub const SERVER_ENV: &str = "COMPLAINT_INTAKE_SERVER";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the wizard server
    pub server_url: String,

    /// Entry path the wizard is opened at; `/v2...` selects the versioned API
    pub entry_path: String,

    /// Timeout for every HTTP request, in seconds
    pub request_timeout_secs: u64,

    /// Autocomplete timings
    pub autocomplete: AutocompleteConfig,

    /// UI preferences
    pub ui: UiConfig,

    /// Application home directory
    #[serde(skip)]
    pub home: PathBuf,
}

/// Autocomplete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteConfig {
    pub debounce_ms: u64,
    pub blur_hide_ms: u64,
    pub min_query_len: usize,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub notice_ttl_secs: u64,
    pub char_count_threshold: usize,
    pub max_message_len: usize,
    pub history_limit: usize,
}

impl Default for AutocompleteConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            blur_hide_ms: 150,
            min_query_len: 2,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            notice_ttl_secs: 3,
            char_count_threshold: 100,
            max_message_len: 2000,
            history_limit: 500,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_url: "http://127.0.0.1:5000".to_string(),
            entry_path: "/".to_string(),
            request_timeout_secs: 30,
            autocomplete: AutocompleteConfig::default(),
            ui: UiConfig::default(),
            home: Self::default_home(),
        }
    }
}

impl Config {
    /// Load configuration from the home directory, then apply the environment override
    pub fn load() -> Result<Self> {
        let home = Self::default_home();
        let mut config = Self::load_from(&home)?;
        if let Ok(server) = std::env::var(SERVER_ENV) {
            if !server.trim().is_empty() {
                config.server_url = server;
            }
        }
        Ok(config)
    }

    /// Load configuration from `config.toml` inside `home`; a missing file yields defaults
    pub fn load_from(home: &Path) -> Result<Self> {
        let config_path = home.join("config.toml");

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file {}", config_path.display()))?
        } else {
            Config::default()
        };

        config.home = home.to_path_buf();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.home)
            .context("Failed to create application directory")?;
        let config_path = self.home.join("config.toml");
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .context("Failed to write config file")?;
        Ok(config_path)
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, server: Option<String>, entry_path: Option<String>) -> Self {
        if let Some(server) = server {
            self.server_url = server;
        }
        if let Some(path) = entry_path {
            self.entry_path = path;
        }
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn log_path(&self) -> PathBuf {
        self.home.join("complaint-intake.log")
    }

    fn default_home() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".complaint-intake")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.server_url, "http://127.0.0.1:5000");
        assert_eq!(config.autocomplete.debounce_ms, 300);
        assert_eq!(config.autocomplete.min_query_len, 2);
        assert_eq!(config.home, dir.path());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "entry_path = \"/v2\"\n[autocomplete]\ndebounce_ms = 500\n",
        )
        .unwrap();

        let config = Config::load_from(dir.path()).unwrap();
        assert_eq!(config.entry_path, "/v2");
        assert_eq!(config.autocomplete.debounce_ms, 500);
        assert_eq!(config.autocomplete.blur_hide_ms, 150);
        assert_eq!(config.ui.notice_ttl_secs, 3);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "server_url = [").unwrap();
        assert!(Config::load_from(dir.path()).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_from(dir.path()).unwrap();
        config.server_url = "https://wizard.example".to_string();
        let path = config.save().unwrap();
        assert!(path.ends_with("config.toml"));

        let loaded = Config::load_from(dir.path()).unwrap();
        assert_eq!(loaded.server_url, "https://wizard.example");
    }

    #[test]
    fn test_overrides_win() {
        let config = Config::default()
            .with_overrides(Some("http://10.0.0.1:8080".into()), Some("/v2".into()));
        assert_eq!(config.server_url, "http://10.0.0.1:8080");
        assert_eq!(config.entry_path, "/v2");
    }
}
