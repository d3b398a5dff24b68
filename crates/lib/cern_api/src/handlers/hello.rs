//! Liveness endpoint.

/// Plain-text body served at `GET /`.
pub const LIVENESS_TEXT: &str = "Cern Logic Backend is running!";

/// `GET /` — liveness check; not part of the chat contract.
pub async fn liveness() -> &'static str {
    LIVENESS_TEXT
}
