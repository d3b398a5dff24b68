//! # cern_core
//!
//! Core domain logic for Cern: the append-only session transcript store,
//! reply generation, and the turn service that ties them together.

pub mod models;
pub mod reply;
pub mod session;
pub mod store;
pub mod turn;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
