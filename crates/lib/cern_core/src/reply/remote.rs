// @awa-component: CHAT-RemoteReply
//
//! Inference-service reply generator.
//!
//! Sends the prior history plus the new prompt to `POST {base}/api/chat` and
//! reads back `{cern_response, thought_process}`. One attempt per turn; a
//! failure surfaces as [`ReplyError::Provider`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use super::{Reply, ReplyError, ReplyGenerator, split_thought};
use crate::models::{Message, Role};

#[derive(Serialize)]
struct HistoryEntry<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    history: Vec<HistoryEntry<'a>>,
    user_prompt: &'a str,
}

#[derive(Deserialize)]
struct InferenceResponse {
    cern_response: String,
    #[serde(default)]
    thought_process: String,
}

/// Reply generator backed by an external inference service.
#[derive(Debug, Clone)]
pub struct RemoteReply {
    client: Client,
    endpoint: Url,
}

impl RemoteReply {
    /// `base_url` is the service root; the chat path is appended.
    pub fn new(client: Client, base_url: &str) -> Result<Self, ReplyError> {
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
impl ReplyGenerator for RemoteReply {
    async fn generate_reply(&self, transcript: &[Message]) -> Result<Reply, ReplyError> {
        let (prompt, history) = match transcript.split_last() {
            Some((last, history)) if last.role == Role::User => (last, history),
            _ => {
                return Err(ReplyError::InvalidTranscript(
                    "transcript must end with a user message".to_string(),
                ));
            }
        };

        let request = InferenceRequest {
            history: history
                .iter()
                .map(|m| HistoryEntry {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            user_prompt: &prompt.content,
        };

        debug!(endpoint = %self.endpoint, history = history.len(), "requesting reply");

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| ReplyError::Provider(format!("inference request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            return Err(ReplyError::Provider(format!(
                "inference service returned {status}: {body}"
            )));
        }

        let data: InferenceResponse = resp
            .json()
            .await
            .map_err(|e| ReplyError::Provider(format!("inference response parse error: {e}")))?;

        // Services that skip the split hand back the raw `<think>` output.
        if data.thought_process.is_empty() {
            return Ok(split_thought(&data.cern_response));
        }
        Ok(Reply::new(data.cern_response, data.thought_process))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::Json;
    use axum::Router;
    use axum::http::StatusCode;
    use axum::routing::post;
    use serde_json::{Value, json};

    use super::*;

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn sends_history_and_prompt_separately() {
        let seen = Arc::new(Mutex::new(None::<Value>));
        let captured = seen.clone();
        let router = Router::new().route(
            "/api/chat",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some(body);
                    Json(json!({
                        "cern_response": "The Phantom has 25 hours of battery.",
                        "thought_process": "Section 2.2."
                    }))
                }
            }),
        );
        let base = serve(router).await;

        let remote = RemoteReply::new(Client::new(), &base).unwrap();
        let transcript = vec![
            Message::user("hi"),
            Message::assistant("hello"),
            Message::user("battery?"),
        ];
        let reply = remote.generate_reply(&transcript).await.unwrap();

        assert_eq!(reply.content, "The Phantom has 25 hours of battery.");
        assert_eq!(reply.explanation, "Section 2.2.");

        let body = seen.lock().unwrap().clone().expect("request captured");
        assert_eq!(body["user_prompt"], "battery?");
        assert_eq!(body["history"].as_array().unwrap().len(), 2);
        assert_eq!(body["history"][1]["role"], "cern");
    }

    #[tokio::test]
    async fn raw_output_is_split_when_thought_missing() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async {
                Json(json!({ "cern_response": "<think>easy</think>Yes." }))
            }),
        );
        let base = serve(router).await;

        let remote = RemoteReply::new(Client::new(), &base).unwrap();
        let reply = remote
            .generate_reply(&[Message::user("ok?")])
            .await
            .unwrap();
        assert_eq!(reply.content, "Yes.");
        assert_eq!(reply.explanation, "easy");
    }

    #[tokio::test]
    async fn error_status_is_a_provider_error() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async { (StatusCode::BAD_GATEWAY, "model offline") }),
        );
        let base = serve(router).await;

        let remote = RemoteReply::new(Client::new(), &base).unwrap();
        let err = remote
            .generate_reply(&[Message::user("hello")])
            .await
            .unwrap_err();
        match err {
            ReplyError::Provider(msg) => assert!(msg.contains("502"), "unexpected: {msg}"),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transcript_must_end_with_user_message() {
        let remote = RemoteReply::new(Client::new(), "http://127.0.0.1:9/").unwrap();
        let err = remote
            .generate_reply(&[Message::assistant("orphan")])
            .await
            .unwrap_err();
        assert!(matches!(err, ReplyError::InvalidTranscript(_)));
    }

    #[test]
    fn endpoint_joins_chat_path() {
        let remote = RemoteReply::new(Client::new(), "http://infer.local:8001/").unwrap();
        assert_eq!(remote.endpoint().as_str(), "http://infer.local:8001/api/chat");
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let remote = RemoteReply::new(Client::new(), "http://gpu-box/inference").unwrap();
        assert_eq!(remote.endpoint().as_str(), "http://gpu-box/inference/api/chat");

        let remote = RemoteReply::new(Client::new(), "http://gpu-box/inference/").unwrap();
        assert_eq!(remote.endpoint().as_str(), "http://gpu-box/inference/api/chat");
    }
}
