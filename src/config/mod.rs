use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// YouTube access settings
    pub youtube: YoutubeConfig,

    /// Application settings
    pub app: AppConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoutubeConfig {
    /// YouTube Data API v3 key, used for playlists and channels
    pub api_key: Option<String>,

    /// Netscape cookie file sent with every page request
    pub cookies_path: Option<PathBuf>,

    /// Language codes tried in order when none are given
    pub default_languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Default output format
    pub default_output_format: OutputFormat,

    /// Videos processed at once by playlist and channel commands
    pub max_concurrent_jobs: usize,

    /// Abort a batch at its first failing video
    pub stop_on_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube: YoutubeConfig {
                api_key: None,
                cookies_path: None,
                default_languages: vec!["en".to_string()],
            },
            app: AppConfig {
                default_output_format: OutputFormat::Text,
                max_concurrent_jobs: 3,
                stop_on_error: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from file or create default
    pub async fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save().await?;
            Ok(config)
        }
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // First try current directory for easy testing
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("youtube-transcripts").join("config.yaml"))
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.app.max_concurrent_jobs == 0 {
            anyhow::bail!("max_concurrent_jobs must be at least 1");
        }

        if self.youtube.default_languages.is_empty() {
            anyhow::bail!("default_languages must name at least one language code");
        }

        if self.youtube.default_languages.iter().any(|c| c.trim().is_empty()) {
            anyhow::bail!("default_languages must not contain blank codes");
        }

        Ok(())
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!(
            "  API Key: {}",
            if self.youtube.api_key.is_some() { "set" } else { "not set" }
        );
        if let Some(path) = &self.youtube.cookies_path {
            println!("  Cookies File: {}", path.display());
        }
        println!("  Default Languages: {}", self.youtube.default_languages.join(", "));
        println!("  Default Format: {}", self.app.default_output_format);
        println!("  Max Concurrent Jobs: {}", self.app.max_concurrent_jobs);
        println!("  Stop On Error: {}", self.app.stop_on_error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = serde_yaml::to_string(&Config::default()).unwrap();
        assert!(yaml.contains("default_output_format: text"));

        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs_err::write(
            &path,
            "youtube:\n  api_key: KEY\n  cookies_path: null\n  default_languages: [de, en]\n\
             app:\n  default_output_format: pretty-json\n  max_concurrent_jobs: 5\n  stop_on_error: false\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.youtube.api_key.as_deref(), Some("KEY"));
        assert_eq!(config.youtube.default_languages, vec!["de", "en"]);
        assert_eq!(config.app.default_output_format, OutputFormat::PrettyJson);
        assert_eq!(config.app.max_concurrent_jobs, 5);
        assert!(!config.app.stop_on_error);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.app.max_concurrent_jobs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.youtube.default_languages = vec![" ".to_string()];
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_ok());
    }
}
