//! Configuration management
//!
//! This module handles loading, validation, and management of the Turnstile
//! configuration. Configuration is stored in TOML format at
//! ~/.turnstile/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, data directory, history file, history window
//! - **providers**: JSON-RPC endpoints for the search and summarize servers
//! - **llm**: Chat completion settings used for intent detection and
//!   conversation answers
//! - **search_api**: Upstream search API used by the search provider server
//!
//! Every section has defaults, so a partial file (or none at all) is valid.
//!
//! # Examples
//!
//! ```no_run
//! use turnstile_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("History file: {:?}", config.history_path());
//! println!("Search server: {}", config.providers.search.url);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    #[serde(default)]
    pub core: CoreConfig,

    /// Remote capability provider endpoints
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// LLM settings
    #[serde(default)]
    pub llm: LLMConfig,

    /// Upstream search API (used by the search provider server)
    #[serde(default)]
    pub search_api: SearchApiConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory path (supports ~ expansion)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// History file name, relative to `data_dir` unless absolute
    #[serde(default = "default_history_file")]
    pub history_file: PathBuf,

    /// Number of recent turns given to the LLM as context
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

/// Provider endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Per-request timeout applied by every provider client
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Search provider server
    #[serde(default = "default_search_endpoint")]
    pub search: RpcEndpointConfig,

    /// Summarize provider server
    #[serde(default = "default_summary_endpoint")]
    pub summary: RpcEndpointConfig,
}

/// A single JSON-RPC endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcEndpointConfig {
    /// Full URL of the `/rpc` route
    pub url: String,
}

/// LLM configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LLMConfig {
    /// OpenAI-compatible chat completion settings
    #[serde(default)]
    pub openai: OpenAIConfig,
}

/// OpenAI provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for OpenAI API
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,
}

/// Upstream search API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchApiConfig {
    /// Base URL of the search API
    #[serde(default = "default_search_api_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_search_api_key_env")]
    pub api_key_env: String,

    /// Number of organic results requested per query
    #[serde(default = "default_num_results")]
    pub num_results: u32,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.turnstile")
}

fn default_history_file() -> PathBuf {
    PathBuf::from("state.csv")
}

fn default_history_window() -> usize {
    5
}

fn default_request_timeout() -> u64 {
    60
}

fn default_search_endpoint() -> RpcEndpointConfig {
    RpcEndpointConfig {
        url: "http://localhost:8001/rpc".to_string(),
    }
}

fn default_summary_endpoint() -> RpcEndpointConfig {
    RpcEndpointConfig {
        url: "http://localhost:8002/rpc".to_string(),
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4.1-nano".to_string()
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_search_api_base_url() -> String {
    "https://google.serper.dev".to_string()
}

fn default_search_api_key_env() -> String {
    "SERPER_API_KEY".to_string()
}

fn default_num_results() -> u32 {
    5
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
            history_file: default_history_file(),
            history_window: default_history_window(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            search: default_search_endpoint(),
            summary: default_summary_endpoint(),
        }
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            model: default_openai_model(),
            api_key_env: default_openai_key_env(),
        }
    }
}

impl Default for SearchApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_search_api_base_url(),
            api_key_env: default_search_api_key_env(),
            num_results: default_num_results(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.turnstile/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(&Config::default())
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, &toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        let mut config = Config::default();
        config.validate_and_process()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.turnstile/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".turnstile").join("config.toml"))
    }

    /// Full path of the history file
    pub fn history_path(&self) -> PathBuf {
        self.core.data_dir.join(&self.core.history_file)
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates the log level, endpoints and numeric bounds
    /// - Expands ~ in the data directory
    /// - Creates the data directory if it doesn't exist
    pub fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.core.history_window == 0 {
            return Err(EngineError::Config(
                "history_window must be at least 1".to_string(),
            ));
        }

        if self.providers.request_timeout_secs == 0 {
            return Err(EngineError::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }

        for (name, url) in [
            ("providers.search.url", &self.providers.search.url),
            ("providers.summary.url", &self.providers.summary.url),
            ("llm.openai.base_url", &self.llm.openai.base_url),
            ("search_api.base_url", &self.search_api.base_url),
        ] {
            validate_url(name, url)?;
        }

        if self.core.history_file.as_os_str().is_empty() {
            return Err(EngineError::Config(
                "history_file must not be empty".to_string(),
            ));
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;

        if !self.core.data_dir.exists() {
            fs::create_dir_all(&self.core.data_dir).map_err(|e| {
                EngineError::Config(format!("Failed to create data directory: {}", e))
            })?;
        }

        Ok(())
    }
}

fn validate_url(name: &str, url: &str) -> Result<(), EngineError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(EngineError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            name, url
        )))
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_creation() {
        let config = Config::default();

        assert_eq!(config.core.log_level, "info");
        assert_eq!(config.core.history_window, 5);
        assert_eq!(config.providers.search.url, "http://localhost:8001/rpc");
        assert_eq!(config.providers.summary.url, "http://localhost:8002/rpc");
        assert_eq!(config.llm.openai.model, "gpt-4.1-nano");
        assert_eq!(config.search_api.num_results, 5);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test");
        let expanded = expand_path(&path).unwrap();

        let home = dirs::home_dir().unwrap();
        assert_eq!(expanded, home.join("test"));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let path = PathBuf::from("/absolute/path");
        let expanded = expand_path(&path).unwrap();

        assert_eq!(expanded, path);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!(
            "[core]\ndata_dir = {:?}\n\n[providers.search]\nurl = \"http://10.0.0.2:9001/rpc\"\n",
            dir.path().to_str().unwrap()
        );

        let config = Config::from_toml_str(&toml).unwrap();
        assert_eq!(config.providers.search.url, "http://10.0.0.2:9001/rpc");
        assert_eq!(config.providers.summary.url, "http://localhost:8002/rpc");
        assert_eq!(config.history_path(), dir.path().join("state.csv"));
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let err = Config::from_toml_str("[core]\nlog_level = \"loud\"\n").unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err =
            Config::from_toml_str("[providers.summary]\nurl = \"localhost:8002\"\n").unwrap_err();
        assert!(err.to_string().contains("providers.summary.url"));
    }

    #[test]
    fn test_zero_window_rejected() {
        let err = Config::from_toml_str("[core]\nhistory_window = 0\n").unwrap_err();
        assert!(err.to_string().contains("history_window"));
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_string = toml::to_string(&config).unwrap();

        let deserialized: Config = toml::from_str(&toml_string).unwrap();
        assert_eq!(config.core.log_level, deserialized.core.log_level);
        assert_eq!(config.providers.search.url, deserialized.providers.search.url);
        assert_eq!(config.llm.openai.api_key_env, deserialized.llm.openai.api_key_env);
    }
}
