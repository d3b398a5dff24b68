//! HTTP transport for the chat endpoint.

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use url::Url;

use crate::models::{ChatRequest, ChatResponse};

/// Why a turn request did not produce a reply.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("API request failed with status {0}")]
    Status(u16),

    /// No response was received.
    #[error("network error: {0}")]
    Network(String),

    /// A success response whose body could not be read.
    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Sends one turn and returns the parsed reply.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_turn(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError>;
}

/// reqwest-backed transport posting to `{base}/api/chat`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: Url,
}

impl ApiClient {
    /// `base_url` is the server root, e.g. `http://localhost:8000`.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, TransportError> {
        let endpoint = chat_endpoint(base_url)?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// `{base}/api/chat`, keeping any path prefix on the base.
fn chat_endpoint(base_url: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(base_url)?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("api/chat")
}

#[async_trait]
impl ChatTransport for ApiClient {
    async fn send_turn(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError> {
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        resp.json::<ChatResponse>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
