use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::info;

use crate::config::Config;
use crate::credentials::{self, AccessToken, Credentials};
use crate::error::{AssistError, RunError};
use crate::repl::{self, ErrorPolicy, Mode};
use crate::session::{AssistTransport, SessionSettings, TextAssistant};

/// Load and refresh credentials, open the transport with `connect`, and run
/// `mode` against it.
///
/// Credential failures return before `connect` is ever called, so no RPC is
/// attempted without a live token. The transport lives inside the session
/// and is dropped when this returns, whichever way it returns.
pub async fn run<C, Fut, T, R, W>(
    config: &Config,
    mode: Mode,
    connect: C,
    input: R,
    output: &mut W,
) -> Result<(), RunError>
where
    C: FnOnce(AccessToken) -> Fut,
    Fut: Future<Output = Result<T, AssistError>>,
    T: AssistTransport,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let http = credentials::http_client()?;
    let mut credentials = Credentials::from_file(&config.credentials).await?;
    let token = credentials.refresh(&http).await?;

    let transport = connect(token).await?;
    let mut assistant = TextAssistant::new(SessionSettings::from_config(config), transport);

    match mode {
        Mode::SingleShot(query) => repl::single_shot(&mut assistant, &query, output).await,
        Mode::Interactive => {
            info!(language = %config.language_code, "Starting conversation");
            repl::interactive(
                &mut assistant,
                &config.prompt,
                ErrorPolicy::from_flag(config.continue_on_error),
                input,
                output,
            )
            .await
        }
    }
}
