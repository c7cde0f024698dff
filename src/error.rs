use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Failures while loading or refreshing the stored OAuth2 credentials.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("could not read credentials file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed credentials file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("credentials field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("token refresh request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint rejected the refresh (HTTP {status}): {detail}")]
    Rejected { status: u16, detail: String },

    #[error("token endpoint response did not contain an access token")]
    MissingAccessToken,
}

/// Configuration file and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while talking to the assistant service.
#[derive(Error, Debug)]
pub enum AssistError {
    #[error("invalid endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: tonic::transport::Error,
    },

    #[error("TLS configuration failed: {0}")]
    Tls(#[from] tonic::transport::Error),

    #[error("access token cannot be sent as request metadata")]
    InvalidToken,

    #[error("assist call failed: {0}")]
    Status(#[from] tonic::Status),

    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

/// Everything that can end a run of the client.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Assist(#[from] AssistError),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}
