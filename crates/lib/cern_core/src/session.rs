// @awa-component: CHAT-SessionIds
//
// Session ids are opaque to clients and minted server-side as random v4
// UUIDs. Message row ids use UUIDv7 so they sort by insertion time.

use uuid::Uuid;

/// Mint a fresh, globally unique session id.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Treat a missing, empty, or whitespace-only id as "no session".
pub fn supplied_session_id(session_id: Option<&str>) -> Option<&str> {
    session_id.filter(|id| !id.trim().is_empty())
}
