//! OAuth2 credentials saved by `google-oauthlib-tool`.
//!
//! The stored record holds a refresh token and the client identity. Any
//! access token in the file is ignored; a fresh one is always fetched from
//! the token endpoint over plain HTTPS before the gRPC channel is opened.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::CredentialError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// Operator hint logged whenever credentials can't be used.
pub const REMEDIATION: &str = "Run google-oauthlib-tool to initialize new OAuth 2.0 credentials.";

/// Bearer token attached to every assist call.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, Clone, Deserialize)]
struct StoredCredentials {
    refresh_token: String,
    client_id: String,
    client_secret: String,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    #[serde(default)]
    scopes: Vec<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

#[derive(Debug)]
pub struct Credentials {
    stored: StoredCredentials,
    access_token: Option<AccessToken>,
}

impl Credentials {
    /// Parse a credentials file. The result has no access token until
    /// [`Credentials::refresh`] succeeds.
    pub async fn from_file(path: &Path) -> Result<Self, CredentialError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| CredentialError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let stored: StoredCredentials =
            serde_json::from_slice(&bytes).map_err(|source| CredentialError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_stored(stored)
    }

    fn from_stored(stored: StoredCredentials) -> Result<Self, CredentialError> {
        if stored.refresh_token.is_empty() {
            return Err(CredentialError::EmptyField("refresh_token"));
        }
        if stored.client_id.is_empty() {
            return Err(CredentialError::EmptyField("client_id"));
        }
        Ok(Self {
            stored,
            access_token: None,
        })
    }

    pub fn token_uri(&self) -> &str {
        &self.stored.token_uri
    }

    pub fn scopes(&self) -> &[String] {
        &self.stored.scopes
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.access_token.as_ref()
    }

    /// Form body for the refresh grant. `scope` is only sent when the file lists scopes.
    fn refresh_form(&self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", self.stored.refresh_token.clone()),
            ("client_id", self.stored.client_id.clone()),
            ("client_secret", self.stored.client_secret.clone()),
        ];
        if !self.stored.scopes.is_empty() {
            form.push(("scope", self.stored.scopes.join(" ")));
        }
        form
    }

    /// Exchange the refresh token for a new access token, replacing any
    /// previous one in place. Nothing is written back to disk.
    pub async fn refresh(&mut self, http: &reqwest::Client) -> Result<AccessToken, CredentialError> {
        debug!(token_uri = %self.stored.token_uri, "Refreshing OAuth2 access token");

        let response = http
            .post(&self.stored.token_uri)
            .form(&self.refresh_form())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = match serde_json::from_str::<TokenErrorResponse>(&text) {
                Ok(body) => match body.error_description {
                    Some(description) => format!("{}: {}", body.error, description),
                    None => body.error,
                },
                Err(_) => text.chars().take(200).collect(),
            };
            return Err(CredentialError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        let body: TokenResponse = response.json().await?;
        let token = body
            .access_token
            .filter(|token| !token.is_empty())
            .map(AccessToken::new)
            .ok_or(CredentialError::MissingAccessToken)?;

        info!(expires_in = ?body.expires_in, "Obtained OAuth2 access token");
        self.access_token = Some(token.clone());
        Ok(token)
    }
}

/// HTTP client used only for the token refresh.
pub fn http_client() -> Result<reqwest::Client, CredentialError> {
    Ok(reqwest::Client::builder().timeout(REFRESH_TIMEOUT).build()?)
}
