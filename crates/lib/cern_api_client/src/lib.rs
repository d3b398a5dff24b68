//! # cern_api_client
//!
//! Client side of the Cern chat API: a typed transport for `POST /api/chat`,
//! storage for the session token, and [`SessionManager`], which owns the
//! visible transcript and the one-turn-at-a-time busy flag.

pub mod models;
pub mod session;
pub mod storage;
pub mod transport;

pub use models::{ChatRequest, ChatResponse};
pub use session::{SessionManager, SubmitOutcome, TranscriptEntry, TranscriptRole};
pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage, StorageError};
pub use transport::{ApiClient, ChatTransport, TransportError};
