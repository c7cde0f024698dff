//! Single-shot and interactive front ends over one [`TextAssistant`].

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::config::PromptSettings;
use crate::error::RunError;
use crate::session::{AssistTransport, TextAssistant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Answer one query, then exit.
    SingleShot(String),
    /// Prompt for queries until input ends.
    Interactive,
}

/// What to do when a turn fails in interactive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// End the loop and surface the error.
    #[default]
    FailFast,
    /// Log the failure and prompt again.
    Continue,
}

impl ErrorPolicy {
    pub fn from_flag(continue_on_error: bool) -> Self {
        if continue_on_error {
            ErrorPolicy::Continue
        } else {
            ErrorPolicy::FailFast
        }
    }
}

/// Send `query` once and print the reply, or an empty line when there is none.
pub async fn single_shot<T, W>(
    assistant: &mut TextAssistant<T>,
    query: &str,
    output: &mut W,
) -> Result<(), RunError>
where
    T: AssistTransport,
    W: AsyncWrite + Unpin,
{
    let reply = assistant.assist(query).await?;
    let line = format!("{}\n", reply.unwrap_or_default());
    output.write_all(line.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

/// Prompt, read a line, assist, print; repeat until `input` is exhausted.
/// Whitespace-only lines prompt again without calling the service; other
/// lines are sent as typed, minus the line ending.
pub async fn interactive<T, R, W>(
    assistant: &mut TextAssistant<T>,
    prompts: &PromptSettings,
    policy: ErrorPolicy,
    mut input: R,
    output: &mut W,
) -> Result<(), RunError>
where
    T: AssistTransport,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();
    loop {
        output.write_all(prompts.input.as_bytes()).await?;
        output.flush().await?;

        line.clear();
        if input.read_line(&mut line).await? == 0 {
            info!("End of input, leaving conversation");
            output.write_all(b"\n").await?;
            output.flush().await?;
            return Ok(());
        }
        let query = line.trim_end_matches(['\r', '\n']);
        if query.trim().is_empty() {
            continue;
        }

        match assistant.assist(query).await {
            Ok(reply) => {
                let text = format!("{} {}\n", prompts.output, reply.unwrap_or_default());
                output.write_all(text.as_bytes()).await?;
                output.flush().await?;
            }
            Err(e) if policy == ErrorPolicy::Continue => {
                error!(error = %e, "Assist call failed; conversation state kept");
            }
            Err(e) => return Err(e.into()),
        }
    }
}
