use std::io;

use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::pb::{assist_request, AssistRequest, AssistResponse};

/// Install the stderr subscriber. `RUST_LOG` wins when set; otherwise this
/// crate logs at debug with `--verbose` and everything at info.
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info,assistant_text=debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

/// Copy of `request` with any audio payload emptied, plus the payload size.
pub fn redact_request(request: &AssistRequest) -> (AssistRequest, usize) {
    let mut redacted = request.clone();
    let mut audio_bytes = 0;
    if let Some(assist_request::Type::AudioIn(audio)) = &mut redacted.r#type {
        audio_bytes = audio.len();
        audio.clear();
    }
    (redacted, audio_bytes)
}

/// Copy of `response` with `audio_out` data emptied, plus the payload size.
pub fn redact_response(response: &AssistResponse) -> (AssistResponse, usize) {
    let mut redacted = response.clone();
    let mut audio_bytes = 0;
    if let Some(audio) = &mut redacted.audio_out {
        audio_bytes = audio.audio_data.len();
        audio.audio_data.clear();
    }
    (redacted, audio_bytes)
}

pub fn log_request(request: &AssistRequest) {
    let (redacted, audio_bytes) = redact_request(request);
    if audio_bytes > 0 {
        debug!(audio_bytes, "AssistRequest: audio_in");
    } else {
        debug!(request = ?redacted, "AssistRequest");
    }
}

pub fn log_response(response: &AssistResponse) {
    let (redacted, audio_bytes) = redact_response(response);
    if audio_bytes > 0 {
        debug!(audio_bytes, "AssistResponse: audio_out");
    }
    debug!(response = ?redacted, "AssistResponse");
}
