//! One assistant conversation: builds a request per turn, folds the
//! response stream, and carries the opaque conversation state forward.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use tracing::debug;

use crate::config::Config;
use crate::error::AssistError;
use crate::logging;
use crate::pb::{
    assist_config, assist_request, AssistConfig, AssistRequest, AssistResponse, AudioOutConfig,
    DeviceConfig, DialogStateIn,
};

pub type AssistStream = Pin<Box<dyn Stream<Item = Result<AssistResponse, AssistError>> + Send>>;

/// Opens one Assist exchange. Implemented over gRPC by
/// [`AuthorizedChannel`](crate::channel::AuthorizedChannel); tests script it.
#[async_trait]
pub trait AssistTransport: Send {
    async fn open(
        &mut self,
        request: AssistRequest,
        deadline: Duration,
    ) -> Result<AssistStream, AssistError>;
}

/// Per-session request fields.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub language_code: String,
    pub device_model_id: String,
    pub device_id: String,
    pub deadline: Duration,
    pub audio_out: AudioOutConfig,
}

impl SessionSettings {
    pub fn from_config(config: &Config) -> Self {
        let encoding: crate::pb::audio_out_config::Encoding = config.audio_out.encoding.into();
        Self {
            language_code: config.language_code.clone(),
            device_model_id: config.device.model_id.clone(),
            device_id: config.device.instance_id.clone(),
            deadline: config.grpc_deadline(),
            audio_out: AudioOutConfig {
                encoding: encoding as i32,
                sample_rate_hertz: config.audio_out.sample_rate_hertz,
                volume_percentage: config.audio_out.volume_percentage,
            },
        }
    }
}

/// Dialog context held between turns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Conversation {
    #[default]
    Idle,
    /// Last non-empty state the service returned, kept byte-for-byte.
    Ongoing(Vec<u8>),
}

impl Conversation {
    /// Bytes to send as `dialog_state_in.conversation_state`.
    pub fn state(&self) -> &[u8] {
        match self {
            Conversation::Idle => &[],
            Conversation::Ongoing(state) => state,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Conversation::Idle)
    }
}

/// What one exchange produced. Later messages overwrite earlier ones,
/// field by field, and only when they carry a non-empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Turn {
    pub conversation_state: Option<Vec<u8>>,
    pub display_text: Option<String>,
}

impl Turn {
    pub fn absorb(&mut self, response: &AssistResponse) {
        let Some(dialog) = &response.dialog_state_out else {
            return;
        };
        if !dialog.conversation_state.is_empty() {
            self.conversation_state = Some(dialog.conversation_state.clone());
        }
        if !dialog.supplemental_display_text.is_empty() {
            self.display_text = Some(dialog.supplemental_display_text.clone());
        }
    }

    /// Drain a response stream. The first error aborts the fold and nothing
    /// gathered so far is returned.
    pub async fn collect(mut stream: AssistStream) -> Result<Turn, AssistError> {
        let mut turn = Turn::default();
        while let Some(item) = stream.next().await {
            let response = item?;
            logging::log_response(&response);
            turn.absorb(&response);
        }
        Ok(turn)
    }
}

/// Text-only assistant session over a single transport.
pub struct TextAssistant<T> {
    settings: SessionSettings,
    transport: T,
    conversation: Conversation,
}

impl<T: AssistTransport> TextAssistant<T> {
    pub fn new(settings: SessionSettings, transport: T) -> Self {
        Self {
            settings,
            transport,
            conversation: Conversation::Idle,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn build_request(&self, text_query: &str) -> AssistRequest {
        let config = AssistConfig {
            r#type: Some(assist_config::Type::TextQuery(text_query.to_string())),
            audio_out_config: Some(self.settings.audio_out.clone()),
            screen_out_config: None,
            dialog_state_in: Some(DialogStateIn {
                conversation_state: self.conversation.state().to_vec(),
                language_code: self.settings.language_code.clone(),
                is_new_conversation: false,
            }),
            device_config: Some(DeviceConfig {
                device_id: self.settings.device_id.clone(),
                device_model_id: self.settings.device_model_id.clone(),
            }),
            debug_config: None,
        };
        AssistRequest {
            r#type: Some(assist_request::Type::Config(config)),
        }
    }

    /// Send one text query and return the assistant's display text, if any.
    ///
    /// On any error, including the deadline passing mid-stream, the held
    /// conversation state is left exactly as it was before the call.
    pub async fn assist(&mut self, text_query: &str) -> Result<Option<String>, AssistError> {
        let request = self.build_request(text_query);
        logging::log_request(&request);

        let deadline = self.settings.deadline;
        let exchange = async {
            let stream = self.transport.open(request, deadline).await?;
            Turn::collect(stream).await
        };
        let turn = tokio::time::timeout(deadline, exchange)
            .await
            .map_err(|_| AssistError::DeadlineExceeded(deadline))??;

        if let Some(state) = turn.conversation_state {
            debug!(bytes = state.len(), "Updated conversation state");
            self.conversation = Conversation::Ongoing(state);
        }
        Ok(turn.display_text)
    }
}
