//! Configuration management
//!
//! Manages provider settings, offline latencies, session tuning and storage
//! location. Stored as TOML in the platform config directory.

use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Live content provider settings
    #[serde(default)]
    pub provider: ProviderSettings,
    /// Offline substitute settings
    #[serde(default)]
    pub offline: OfflineConfig,
    /// Lesson session settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Where progress is stored
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// OpenAI-compatible base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used for every generation request
    #[serde(default = "default_model")]
    pub model: String,
    /// Upper bound on a single provider call
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_base_url() -> String {
    crate::provider::llm::OPENROUTER_BASE_URL.to_string()
}

fn default_model() -> String {
    "google/gemini-2.5-flash".to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Simulated latency (milliseconds) of each offline operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineConfig {
    /// Use offline content even when a credential is configured
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_path_ms")]
    pub path_ms: u64,
    #[serde(default = "default_content_ms")]
    pub content_ms: u64,
    #[serde(default = "default_evaluation_ms")]
    pub evaluation_ms: u64,
    #[serde(default = "default_resources_ms")]
    pub resources_ms: u64,
    #[serde(default = "default_topic_ms")]
    pub topic_ms: u64,
}

fn default_path_ms() -> u64 { 1000 }
fn default_content_ms() -> u64 { 1500 }
fn default_evaluation_ms() -> u64 { 1500 }
fn default_resources_ms() -> u64 { 1000 }
fn default_topic_ms() -> u64 { 800 }

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path_ms: default_path_ms(),
            content_ms: default_content_ms(),
            evaluation_ms: default_evaluation_ms(),
            resources_ms: default_resources_ms(),
            topic_ms: default_topic_ms(),
        }
    }
}

impl OfflineConfig {
    pub fn zero_latency() -> Self {
        Self {
            enabled: false,
            path_ms: 0,
            content_ms: 0,
            evaluation_ms: 0,
            resources_ms: 0,
            topic_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// How often the loading caption rotates
    #[serde(default = "default_caption_interval")]
    pub caption_interval_ms: u64,
    /// XP awarded the first time a module is completed
    #[serde(default = "default_completion_bonus")]
    pub completion_bonus_xp: u64,
}

fn default_caption_interval() -> u64 {
    2000
}

fn default_completion_bonus() -> u64 {
    100
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            caption_interval_ms: default_caption_interval(),
            completion_bonus_xp: default_completion_bonus(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Override for the progress directory (defaults to the data dir)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = config_path()?;
        let parent = config_path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Directory holding the persisted progress slots
    pub fn storage_dir(&self) -> Result<PathBuf> {
        match &self.storage.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(data_dir()?.join("progress")),
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "cognosys", "cognosys")
        .context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;
    let has_key = crate::security::keyring::has_api_key();

    println!("Configuration ({})", config_path()?.display());
    println!("  provider.base_url:      {}", config.provider.base_url);
    println!("  provider.model:         {}", config.provider.model);
    println!("  provider.timeout_secs:  {}", config.provider.timeout_secs);
    println!("  provider credential:    {}", if has_key { "configured" } else { "not configured (offline content)" });
    println!("  offline.enabled:        {}", config.offline.enabled);
    println!("  session.caption_ms:     {}", config.session.caption_interval_ms);
    println!("  session.completion_xp:  {}", config.session.completion_bonus_xp);
    println!("  storage.dir:            {}", config.storage_dir()?.display());

    Ok(())
}

/// Set API key
pub fn set_api_key(key: &str) -> Result<()> {
    crate::security::keyring::set_api_key(key)?;
    println!("API key stored securely.");
    Ok(())
}

/// Remove the stored API key from the keyring and key file
pub fn clear_api_key() -> Result<()> {
    crate::security::keyring::delete_api_key()?;
    if std::env::var(crate::security::keyring::API_KEY_ENV).is_ok() {
        println!("Stored API key removed. {} is still set in the environment.", crate::security::keyring::API_KEY_ENV);
    } else {
        println!("API key removed. Lessons will use offline content.");
    }
    Ok(())
}

/// Set the generation model
pub fn set_model(model: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.provider.model = model.to_string();
    config.save()?;
    println!("Model set to: {}", model);
    Ok(())
}

/// Force or release offline mode
pub fn set_offline(enabled: bool) -> Result<()> {
    let mut config = Config::load()?;
    config.offline.enabled = enabled;
    config.save()?;
    println!("Offline mode {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| "# Default configuration\n".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str("[provider]\nmodel = \"x/y\"\n").unwrap();
        assert_eq!(config.provider.model, "x/y");
        assert_eq!(config.provider.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.offline.content_ms, 1500);
        assert_eq!(config.session.completion_bonus_xp, 100);
        assert!(config.storage.dir.is_none());
    }

    #[test]
    fn test_default_toml_round_trips() {
        let text = default_config_toml();
        let config: Config = toml::from_str(&text).unwrap();
        assert_eq!(config.offline, OfflineConfig::default());
        assert_eq!(config.session.caption_interval_ms, 2000);
    }

    #[test]
    fn test_storage_dir_override() {
        let mut config = Config::default();
        config.storage.dir = Some(PathBuf::from("/tmp/cognosys-test"));
        assert_eq!(config.storage_dir().unwrap(), PathBuf::from("/tmp/cognosys-test"));
    }
}
