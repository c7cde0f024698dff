use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::pb::audio_out_config;

pub const DEFAULT_API_ENDPOINT: &str = "embeddedassistant.googleapis.com";
pub const DEFAULT_GRPC_DEADLINE_SECS: u64 = 60 * 3 + 5;

/// Client configuration. Every field has a default so a partial TOML file
/// (or none at all) is enough.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Address of the Google Assistant API service
    pub api_endpoint: String,
    /// Path to the OAuth2 credentials written by google-oauthlib-tool
    pub credentials: PathBuf,
    /// Language code of the Assistant
    pub language_code: String,
    /// gRPC deadline in seconds for one Assist call
    pub grpc_deadline_secs: u64,
    pub device: DeviceSettings,
    pub audio_out: AudioOutSettings,
    pub prompt: PromptSettings,
    /// Report a failed turn and keep prompting instead of exiting
    pub continue_on_error: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_API_ENDPOINT.to_string(),
            credentials: default_credentials_path(),
            language_code: "en-US".to_string(),
            grpc_deadline_secs: DEFAULT_GRPC_DEADLINE_SECS,
            device: DeviceSettings::default(),
            audio_out: AudioOutSettings::default(),
            prompt: PromptSettings::default(),
            continue_on_error: false,
        }
    }
}

/// Registered device identity sent with every request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceSettings {
    pub model_id: String,
    pub instance_id: String,
}

/// Audio output format. Text queries get no audio played back, but the
/// service still requires the block on every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioOutSettings {
    pub encoding: AudioEncoding,
    pub sample_rate_hertz: i32,
    pub volume_percentage: i32,
}

impl Default for AudioOutSettings {
    fn default() -> Self {
        Self {
            encoding: AudioEncoding::Linear16,
            sample_rate_hertz: 16000,
            volume_percentage: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AudioEncoding {
    Linear16,
    Mp3,
    OpusInOgg,
}

impl From<AudioEncoding> for audio_out_config::Encoding {
    fn from(encoding: AudioEncoding) -> Self {
        match encoding {
            AudioEncoding::Linear16 => audio_out_config::Encoding::Linear16,
            AudioEncoding::Mp3 => audio_out_config::Encoding::Mp3,
            AudioEncoding::OpusInOgg => audio_out_config::Encoding::OpusInOgg,
        }
    }
}

/// Labels used by the interactive loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptSettings {
    /// Printed before reading each query
    pub input: String,
    /// Printed in front of each reply
    pub output: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            input: ": ".to_string(),
            output: "<@assistant>".to_string(),
        }
    }
}

/// Where google-oauthlib-tool saves credentials by default.
pub fn default_credentials_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("google-oauthlib-tool")
        .join("credentials.json")
}

/// `<config dir>/assistant-text/config.toml`, read when no `--config` is given.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("assistant-text").join("config.toml"))
}

impl Config {
    /// Load from an explicit TOML file, or from the default location when it
    /// exists, or fall back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    pub fn grpc_deadline(&self) -> Duration {
        Duration::from_secs(self.grpc_deadline_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("api_endpoint is empty".into()));
        }
        if self.device.model_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "device model id is required (--device-model-id or [device] model_id)".into(),
            ));
        }
        if self.device.instance_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "device instance id is required (--device-id or [device] instance_id)".into(),
            ));
        }
        if self.language_code.trim().is_empty() {
            return Err(ConfigError::Invalid("language_code is empty".into()));
        }
        if self.grpc_deadline_secs == 0 {
            return Err(ConfigError::Invalid("grpc deadline must be at least one second".into()));
        }
        if self.audio_out.sample_rate_hertz <= 0 {
            return Err(ConfigError::Invalid(format!(
                "audio_out.sample_rate_hertz must be positive, got {}",
                self.audio_out.sample_rate_hertz
            )));
        }
        if !(0..=100).contains(&self.audio_out.volume_percentage) {
            return Err(ConfigError::Invalid(format!(
                "audio_out.volume_percentage must be within 0..=100, got {}",
                self.audio_out.volume_percentage
            )));
        }
        Ok(())
    }
}
