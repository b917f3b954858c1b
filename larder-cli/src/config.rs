use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Backend credentials
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Project API key sent with every request
    pub api_key: Option<String>,
    /// Per-user access token (bearer auth)
    pub access_token: Option<String>,
}

impl AuthConfig {
    /// Returns true if both credentials are present
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.access_token.is_some()
    }
}

/// AI assistant endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssistantConfig {
    /// Endpoint URL (e.g., "https://assistant.example.com")
    pub url: Option<String>,
    /// API key for the assistant endpoint
    pub api_key: Option<String>,
}

impl AssistantConfig {
    /// Returns true if the assistant is configured (has both url and api_key)
    pub fn is_configured(&self) -> bool {
        self.url.is_some() && self.api_key.is_some()
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Backend base URL (REST and realtime share the host)
    pub backend_url: ConfigValue<String>,
    /// Directory for per-device local state
    pub data_dir: ConfigValue<PathBuf>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    /// Backend credentials
    pub auth: AuthConfig,
    /// AI assistant configuration
    pub assistant: AssistantConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    backend_url: Option<String>,
    data_dir: Option<PathBuf>,
    auth: Option<AuthConfig>,
    assistant: Option<AssistantConfig>,
}

const DEFAULT_BACKEND_URL: &str = "http://localhost:54321";

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut backend_url =
            ConfigValue::new(DEFAULT_BACKEND_URL.to_string(), ConfigSource::Default);
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut config_file = None;
        let mut auth = AuthConfig::default();
        let mut assistant = AssistantConfig::default();

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.backend_url {
                backend_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(dir) = file_config.data_dir {
                // Resolve relative paths against config file's directory
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(auth_config) = file_config.auth {
                auth = auth_config;
            }
            if let Some(assistant_config) = file_config.assistant {
                assistant = assistant_config;
            }
        }

        // Apply environment variable overrides
        if let Ok(url) = std::env::var("LARDER_BACKEND_URL") {
            backend_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Ok(dir) = std::env::var("LARDER_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Ok(key) = std::env::var("LARDER_API_KEY") {
            auth.api_key = Some(key);
        }
        if let Ok(token) = std::env::var("LARDER_ACCESS_TOKEN") {
            auth.access_token = Some(token);
        }
        if let Ok(url) = std::env::var("LARDER_ASSISTANT_URL") {
            assistant.url = Some(url);
        }
        if let Ok(key) = std::env::var("LARDER_ASSISTANT_KEY") {
            assistant.api_key = Some(key);
        }

        Ok(Self {
            backend_url,
            data_dir,
            config_file,
            auth,
            assistant,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/larder/
    /// - macOS: ~/Library/Application Support/larder/
    /// - Windows: %APPDATA%/larder/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("larder")
    }

    /// Default data directory (platform-specific):
    /// - Linux: ~/.local/share/larder/
    /// - macOS: ~/Library/Application Support/larder/
    /// - Windows: %APPDATA%/larder/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("larder")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
