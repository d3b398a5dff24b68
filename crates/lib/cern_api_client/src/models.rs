//! Wire types for `POST /api/chat`.

use serde::{Deserialize, Serialize};

/// Request body. `session_id` is sent as `null` until the server issues one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub user_prompt: String,
}

/// Success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub cern_response: String,
    #[serde(default)]
    pub thought_process: Option<String>,
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
}
