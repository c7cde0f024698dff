#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assistant_text::pb::embedded_assistant_server::{EmbeddedAssistant, EmbeddedAssistantServer};
use assistant_text::pb::{assist_request, AssistRequest, AssistResponse, DialogStateOut};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Form, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_stream::Stream;
use tonic::{transport::Server, Request, Response, Status, Streaming};

/// One recorded Assist call.
#[derive(Debug, Clone)]
pub struct Call {
    pub authorization: Option<String>,
    pub requests: Vec<AssistRequest>,
}

impl Call {
    pub fn conversation_state(&self) -> Vec<u8> {
        match &self.requests[0].r#type {
            Some(assist_request::Type::Config(config)) => config
                .dialog_state_in
                .as_ref()
                .map(|d| d.conversation_state.clone())
                .unwrap_or_default(),
            _ => panic!("first message must be a config"),
        }
    }
}

/// In-process stand-in for the assistant service. Each call pops the next
/// scripted batch of responses.
#[derive(Clone, Default)]
pub struct StubAssistant {
    script: Arc<Mutex<VecDeque<Vec<AssistResponse>>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    /// Calls at or after this index sleep before replying.
    delay: Option<(usize, Duration)>,
}

type AssistStream = Pin<Box<dyn Stream<Item = Result<AssistResponse, Status>> + Send + 'static>>;

#[tonic::async_trait]
impl EmbeddedAssistant for StubAssistant {
    type AssistStream = AssistStream;

    async fn assist(
        &self,
        request: Request<Streaming<AssistRequest>>,
    ) -> Result<Response<Self::AssistStream>, Status> {
        let authorization = request
            .metadata()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let mut inbound = request.into_inner();
        let mut requests = Vec::new();
        while let Some(next) = inbound.message().await? {
            requests.push(next);
        }
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(Call {
                authorization,
                requests,
            });
            calls.len() - 1
        };

        if let Some((from, delay)) = self.delay {
            if index >= from {
                tokio::time::sleep(delay).await;
            }
        }

        let replies = self.script.lock().unwrap().pop_front().unwrap_or_default();
        let output = tokio_stream::iter(replies.into_iter().map(Ok::<_, Status>));
        Ok(Response::new(Box::pin(output) as Self::AssistStream))
    }
}

impl StubAssistant {
    pub fn scripted(script: Vec<Vec<AssistResponse>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            ..Self::default()
        }
    }

    pub fn with_delay_from(mut self, call_index: usize, delay: Duration) -> Self {
        self.delay = Some((call_index, delay));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Serve on an ephemeral loopback port; returns `http://` address.
    pub async fn serve(&self) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let svc = EmbeddedAssistantServer::new(self.clone());
        tokio::spawn(async move {
            Server::builder()
                .add_service(svc)
                .serve_with_incoming(TcpListenerStream::new(listener))
                .await
                .unwrap();
        });
        format!("http://{addr}")
    }
}

pub fn reply(text: &str, state: &[u8]) -> AssistResponse {
    AssistResponse {
        dialog_state_out: Some(DialogStateOut {
            supplemental_display_text: text.to_string(),
            conversation_state: state.to_vec(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub const ASSISTANT_SCOPE: &str = "https://www.googleapis.com/auth/assistant-sdk-prototype";

/// Token endpoint that accepts exactly one refresh token and requires the
/// assistant scope.
async fn token(Form(form): Form<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    let field = |key: &str| form.get(key).map(String::as_str);
    let valid = field("grant_type") == Some("refresh_token")
        && field("refresh_token") == Some("good-refresh")
        && field("client_id") == Some("client-id")
        && field("client_secret") == Some("client-secret")
        && field("scope") == Some(ASSISTANT_SCOPE);
    if valid {
        (
            StatusCode::OK,
            Json(json!({"access_token": "ya29.fresh", "expires_in": 3599, "token_type": "Bearer"})),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "invalid_grant", "error_description": "Token has been expired or revoked."})),
        )
    }
}

async fn empty_token() -> Json<Value> {
    Json(json!({"token_type": "Bearer"}))
}

/// Serve `/token` and `/empty` on an ephemeral port; returns the base URL.
pub async fn serve_token_endpoint() -> String {
    let app = Router::new()
        .route("/token", post(token))
        .route("/empty", post(empty_token));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Write a google-oauthlib-tool style credentials file into `dir`.
pub fn credentials_file(dir: &tempfile::TempDir, token_uri: &str, refresh_token: &str) -> PathBuf {
    let path = dir.path().join("credentials.json");
    let body = json!({
        "token": "stale",
        "refresh_token": refresh_token,
        "token_uri": token_uri,
        "client_id": "client-id",
        "client_secret": "client-secret",
        "scopes": [ASSISTANT_SCOPE]
    });
    std::fs::write(&path, body.to_string()).unwrap();
    path
}
