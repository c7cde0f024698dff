//! Text client for the Google Assistant embedded API.
//!
//! Sends typed queries over an authenticated gRPC channel and prints the
//! assistant's display text, threading the server's conversation state
//! through consecutive turns.

pub mod app;
pub mod channel;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod logging;
pub mod repl;
pub mod session;

pub mod pb {
    tonic::include_proto!("google.assistant.embedded.v1alpha2");
}

pub use app::run;
pub use channel::{connect, AuthorizedChannel};
pub use cli::Cli;
pub use config::Config;
pub use credentials::{AccessToken, Credentials};
pub use error::{AssistError, ConfigError, CredentialError, RunError};
pub use repl::Mode;
pub use session::{AssistStream, AssistTransport, Conversation, SessionSettings, TextAssistant, Turn};
