//! Configuration settings for Summarist.

use crate::error::{Result, SummaristError};
use crate::media_source::SourceType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub ai: AiSettings,
    pub summary: SummarySettings,
    pub output: OutputSettings,
    pub downloader: DownloaderSettings,
    pub prompts: PromptSettings,
    pub sources: Vec<SourceConfig>,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// File recording which items have been processed.
    /// Relative paths are resolved against `data_dir`.
    pub state_file: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.summarist".to_string(),
            state_file: "state.json".to_string(),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    /// Provider name (informational; any OpenAI-compatible endpoint works).
    pub provider: String,
    /// Base URL of the chat completions API.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// API key. Supports `${VAR}` expansion; falls back to `OPENAI_API_KEY`.
    pub api_key: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            timeout_seconds: 300,
        }
    }
}

/// Summary length preset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
    Custom,
}

/// Summary generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarySettings {
    /// Length preset (short, medium, long, custom). Unknown presets mean medium.
    #[serde(deserialize_with = "deserialize_length")]
    pub length: SummaryLength,
    /// Target word count when `length = "custom"`.
    pub custom_words: u32,
}

impl Default for SummarySettings {
    fn default() -> Self {
        Self {
            length: SummaryLength::Medium,
            custom_words: 2000,
        }
    }
}

impl SummarySettings {
    /// Target summary length in words.
    pub fn target_words(&self) -> u32 {
        match self.length {
            SummaryLength::Short => 500,
            SummaryLength::Medium => 1500,
            SummaryLength::Long => 2500,
            SummaryLength::Custom => self.custom_words,
        }
    }
}

fn deserialize_length<'de, D>(deserializer: D) -> std::result::Result<SummaryLength, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(match raw.trim().to_lowercase().as_str() {
        "short" => SummaryLength::Short,
        "long" => SummaryLength::Long,
        "custom" => SummaryLength::Custom,
        _ => SummaryLength::Medium,
    })
}

/// Archive output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Root directory for archive folders.
    pub root: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            root: "./output".to_string(),
        }
    }
}

/// External downloader (yt-dlp) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderSettings {
    /// Downloader executable name or path.
    pub binary: String,
    /// Hard timeout for each invocation, in seconds.
    pub timeout_seconds: u64,
    /// Subtitle languages in order of preference.
    pub subtitle_languages: Vec<String>,
    /// `--extractor-args` values tried in order after a plain invocation fails.
    pub extractor_args: Vec<String>,
}

impl Default for DownloaderSettings {
    fn default() -> Self {
        Self {
            binary: "yt-dlp".to_string(),
            timeout_seconds: 300,
            subtitle_languages: vec![
                "zh-CN".to_string(),
                "en".to_string(),
                "zh-Hans".to_string(),
                "zh-Hant".to_string(),
            ],
            extractor_args: vec![
                "youtube:player_client=default".to_string(),
                "youtube:player_client=android".to_string(),
            ],
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

/// A subscribed channel, show or uploader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display name.
    pub name: String,
    /// Platform this source lives on.
    #[serde(rename = "type")]
    pub source_type: SourceType,
    /// Channel, uploader space or feed URL.
    pub url: String,
    /// Disabled sources are skipped during scans.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Unlike prompts, the configuration file is mandatory.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if !config_path.exists() {
            return Err(SummaristError::Config(format!(
                "configuration file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML text and expand environment references.
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut settings: Settings = toml::from_str(content)?;
        settings.expand_env();
        Ok(settings)
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("summarist")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the processed-set file path.
    pub fn state_path(&self) -> PathBuf {
        let state = Self::expand_path(&self.general.state_file);
        if state.is_absolute() {
            state
        } else {
            self.data_dir().join(state)
        }
    }

    /// Get the expanded archive root.
    pub fn output_root(&self) -> PathBuf {
        Self::expand_path(&self.output.root)
    }

    /// The API key, if one is configured here or in the environment.
    pub fn api_key(&self) -> Option<String> {
        if !self.ai.api_key.is_empty() {
            return Some(self.ai.api_key.clone());
        }
        std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
    }

    /// Sources that take part in batch scans.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }

    fn expand_env(&mut self) {
        self.ai.api_key = expand_env_value(&self.ai.api_key);
        self.ai.base_url = expand_env_value(&self.ai.base_url);
        self.ai.model = expand_env_value(&self.ai.model);
        self.output.root = expand_env_value(&self.output.root);
        self.general.data_dir = expand_env_value(&self.general.data_dir);
        for source in &mut self.sources {
            source.url = expand_env_value(&source.url);
        }
    }
}

/// Resolve `${VAR}` or `$VAR` values from the environment.
///
/// Only whole-value references are expanded; unset variables become empty.
fn expand_env_value(value: &str) -> String {
    let name = if let Some(inner) = value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        inner
    } else if let Some(inner) = value.strip_prefix('$') {
        inner
    } else {
        return value.to_string();
    };

    std::env::var(name).unwrap_or_default()
}
