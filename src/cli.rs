use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::error::ConfigError;
use crate::repl::Mode;

#[derive(Parser, Debug)]
#[command(name = "assistant-text")]
#[command(about = "Text client for the Google Assistant Service", long_about = None)]
pub struct Cli {
    /// TOML configuration file (defaults to <config dir>/assistant-text/config.toml)
    #[arg(long, env = "ASSISTANT_TEXT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address of Google Assistant API service, e.g. embeddedassistant.googleapis.com
    #[arg(long, env = "ASSISTANT_API_ENDPOINT", value_name = "API_ENDPOINT")]
    pub api_endpoint: Option<String>,

    /// Path to read OAuth2 credentials
    #[arg(long, value_name = "CREDENTIALS")]
    pub credentials: Option<PathBuf>,

    /// Unique device model identifier
    #[arg(long, value_name = "DEVICE_MODEL_ID")]
    pub device_model_id: Option<String>,

    /// Unique registered device instance identifier
    #[arg(long, value_name = "DEVICE_ID")]
    pub device_id: Option<String>,

    /// Language code of the Assistant
    #[arg(long, value_name = "LANGUAGE_CODE")]
    pub lang: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// gRPC deadline in seconds
    #[arg(long, value_name = "SECONDS")]
    pub grpc_deadline: Option<u64>,

    /// Text query to send once; without it (or when empty) the client prompts for queries
    #[arg(long, value_name = "INPUT")]
    pub input: Option<String>,

    /// Report a failed turn and keep prompting instead of exiting
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub continue_on_error: bool,
}

impl Cli {
    /// Overlay command-line values on a loaded config.
    pub fn apply(&self, mut config: Config) -> Config {
        if let Some(endpoint) = &self.api_endpoint {
            config.api_endpoint = endpoint.clone();
        }
        if let Some(path) = &self.credentials {
            config.credentials = path.clone();
        }
        if let Some(model_id) = &self.device_model_id {
            config.device.model_id = model_id.clone();
        }
        if let Some(device_id) = &self.device_id {
            config.device.instance_id = device_id.clone();
        }
        if let Some(lang) = &self.lang {
            config.language_code = lang.clone();
        }
        if let Some(deadline) = self.grpc_deadline {
            config.grpc_deadline_secs = deadline;
        }
        if self.continue_on_error {
            config.continue_on_error = true;
        }
        config
    }

    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let config = self.apply(Config::load(self.config.as_deref())?);
        config.validate()?;
        Ok(config)
    }

    pub fn mode(&self) -> Mode {
        match self.input.as_deref() {
            Some(text) if !text.is_empty() => Mode::SingleShot(text.to_string()),
            _ => Mode::Interactive,
        }
    }
}
