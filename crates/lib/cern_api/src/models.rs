//! Wire types for the chat endpoint.

use serde::{Deserialize, Serialize};

/// `POST /api/chat` request body.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// `null` or absent starts a new session.
    #[serde(default)]
    pub session_id: Option<String>,
    pub user_prompt: String,
}

/// `POST /api/chat` success body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatResponse {
    pub cern_response: String,
    pub thought_process: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Error envelope for every non-2xx response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
