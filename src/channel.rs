//! Authenticated gRPC channel to the assistant service.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::interceptor::InterceptedService;
use tonic::service::Interceptor;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Request, Status};
use tracing::{debug, info};

use crate::credentials::AccessToken;
use crate::error::AssistError;
use crate::pb::embedded_assistant_client::EmbeddedAssistantClient;
use crate::pb::AssistRequest;
use crate::session::{AssistStream, AssistTransport};

const DEFAULT_PORT: u16 = 443;

/// Attaches `authorization: Bearer <token>` to every call.
#[derive(Clone)]
pub struct BearerAuth {
    header: MetadataValue<Ascii>,
}

impl BearerAuth {
    pub fn new(token: &AccessToken) -> Result<Self, AssistError> {
        let header = format!("Bearer {}", token.secret())
            .parse()
            .map_err(|_| AssistError::InvalidToken)?;
        Ok(Self { header })
    }
}

impl Interceptor for BearerAuth {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        request
            .metadata_mut()
            .insert("authorization", self.header.clone());
        Ok(request)
    }
}

/// Turn `host`, `host:port`, or a full URI into a connectable URI.
/// Bare addresses get TLS and port 443; `http://` stays plaintext.
pub fn endpoint_uri(address: &str) -> String {
    let address = address.trim();
    if address.starts_with("http://") || address.starts_with("https://") {
        return address.to_string();
    }
    let has_port = address
        .rsplit_once(':')
        .is_some_and(|(_, port)| port.parse::<u16>().is_ok());
    if has_port {
        format!("https://{address}")
    } else {
        format!("https://{address}:{DEFAULT_PORT}")
    }
}

type AuthorizedClient = EmbeddedAssistantClient<InterceptedService<Channel, BearerAuth>>;

/// Sole owner of the gRPC channel. Dropping it, on any exit path, closes the
/// connection.
pub struct AuthorizedChannel {
    client: AuthorizedClient,
    endpoint: String,
}

impl Drop for AuthorizedChannel {
    fn drop(&mut self) {
        debug!(endpoint = %self.endpoint, "Closing assistant channel");
    }
}

/// Open the channel once for the whole session.
pub async fn connect(address: &str, token: &AccessToken) -> Result<AuthorizedChannel, AssistError> {
    let uri = endpoint_uri(address);
    let mut endpoint =
        Endpoint::from_shared(uri.clone()).map_err(|e| AssistError::InvalidEndpoint {
            endpoint: uri.clone(),
            reason: e.to_string(),
        })?;
    if uri.starts_with("https://") {
        endpoint = endpoint.tls_config(ClientTlsConfig::new())?;
    }

    info!(endpoint = %uri, "Connecting to assistant service");
    let channel = endpoint
        .connect()
        .await
        .map_err(|source| AssistError::Connect {
            endpoint: uri.clone(),
            source,
        })?;

    let client = EmbeddedAssistantClient::with_interceptor(channel, BearerAuth::new(token)?);
    Ok(AuthorizedChannel {
        client,
        endpoint: uri,
    })
}

#[async_trait]
impl AssistTransport for AuthorizedChannel {
    async fn open(
        &mut self,
        request: AssistRequest,
        deadline: Duration,
    ) -> Result<AssistStream, AssistError> {
        // A text query is the config message alone; no audio follows.
        let mut call = Request::new(tokio_stream::iter(vec![request]));
        call.set_timeout(deadline);

        let inbound = self.client.assist(call).await?.into_inner();
        Ok(Box::pin(inbound.map(|item| item.map_err(AssistError::from))))
    }
}
