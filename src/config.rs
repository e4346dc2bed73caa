use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Context, OptionExt, Result, eyre};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::apple_music_rs::client::DEFAULT_APPLE_MUSIC_API_URL;
use crate::ports::config_store::ConfigStore;
use crate::services::retry::RetryPolicy;
use crate::spotify_rs::client::DEFAULT_SPOTIFY_API_URL;

pub const APP_NAME: &str = "playlist-mirror";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spotify playlist ids synced by `sync-all` and the background task.
    pub playlist_ids: Vec<String>,
    /// Minutes between background syncs. `0` disables them.
    pub sync_interval_minutes: u64,
    pub mirror_prefix: String,
    pub tool_name: String,
    pub spotify: SpotifyConfig,
    pub apple_music: AppleMusicConfig,
    pub state: StateConfig,
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotifyConfig {
    pub access_token: Option<String>,
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppleMusicConfig {
    pub developer_token: Option<String>,
    pub user_token: Option<String>,
    pub storefront: String,
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateBackend {
    #[default]
    Sqlite,
    Json,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub backend: StateBackend,
    /// Database file for `sqlite`, directory for `json`.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            playlist_ids: Vec::new(),
            sync_interval_minutes: 60,
            mirror_prefix: "Spotify -".to_string(),
            tool_name: APP_NAME.to_string(),
            spotify: SpotifyConfig::default(),
            apple_music: AppleMusicConfig::default(),
            state: StateConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for AppleMusicConfig {
    fn default() -> Self {
        Self {
            developer_token: None,
            user_token: None,
            storefront: "us".to_string(),
            api_base_url: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            min_delay_ms: policy.min_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
        }
    }
}

/// Expand ~ to home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

fn token_or_env(configured: &Option<String>, var: &str, name: &str) -> Result<String> {
    configured
        .clone()
        .filter(|token| !token.is_empty())
        .or_else(|| std::env::var(var).ok().filter(|token| !token.is_empty()))
        .ok_or_else(|| eyre!("No {name} configured (set it in the config file or {var})"))
}

fn parse_base_url(configured: &Option<String>, default: &str) -> Result<Url> {
    let raw = configured.as_deref().unwrap_or(default);
    // Url::join drops the last path segment unless it ends with a slash
    let raw = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&raw).context(format!("Invalid API base url: {raw}"))
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .context(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Default config file location: `<config_dir>/playlist-mirror/config.toml`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join(APP_NAME).join("config.toml"))
    }

    /// Load the given file, or the default location. A missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let config_path = Self::config_path().ok_or_eyre("Could not determine config directory")?;
        if !config_path.exists() {
            tracing::warn!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::from_file(&config_path)
    }

    /// Write a default config file, refusing to overwrite an existing one
    pub fn create_default(path: &Path) -> Result<()> {
        if path.exists() {
            return Err(eyre!("Config file already exists: {}", path.display()));
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents =
            toml::to_string_pretty(&Self::default()).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .context(format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn spotify_access_token(&self) -> Result<String> {
        token_or_env(
            &self.spotify.access_token,
            "SPOTIFY_ACCESS_TOKEN",
            "Spotify access token",
        )
    }

    pub fn apple_music_developer_token(&self) -> Result<String> {
        token_or_env(
            &self.apple_music.developer_token,
            "APPLE_MUSIC_DEVELOPER_TOKEN",
            "Apple Music developer token",
        )
    }

    pub fn apple_music_user_token(&self) -> Result<String> {
        token_or_env(
            &self.apple_music.user_token,
            "APPLE_MUSIC_USER_TOKEN",
            "Apple Music user token",
        )
    }

    pub fn spotify_base_url(&self) -> Result<Url> {
        parse_base_url(&self.spotify.api_base_url, DEFAULT_SPOTIFY_API_URL)
    }

    pub fn apple_music_base_url(&self) -> Result<Url> {
        parse_base_url(&self.apple_music.api_base_url, DEFAULT_APPLE_MUSIC_API_URL)
    }

    /// Get expanded state path, defaulting into the user's data directory
    pub fn state_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.state.path {
            return Ok(expand_path(path));
        }
        let data_dir = dirs::data_dir()
            .ok_or_eyre("Could not determine data directory")?
            .join(APP_NAME);
        Ok(match self.state.backend {
            StateBackend::Sqlite => data_dir.join("state.db"),
            StateBackend::Json | StateBackend::Memory => data_dir,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts.max(1),
            min_delay: Duration::from_millis(self.retry.min_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms.max(self.retry.min_delay_ms)),
        }
    }
}

impl ConfigStore for Config {
    fn playlist_ids(&self) -> Vec<String> {
        self.playlist_ids.clone()
    }

    fn sync_interval(&self) -> Option<Duration> {
        match self.sync_interval_minutes {
            0 => None,
            minutes => Some(Duration::from_secs(minutes * 60)),
        }
    }
}
