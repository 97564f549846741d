//! Shared types for the Byk booking core
//!
//! Domain models, lifecycle events, paging types and the unified error
//! envelope used by byk-server and its HTTP clients.

pub mod error;
pub mod event;
pub mod models;
pub mod query;

// Re-exports
pub use axum::Json;
pub use event::{BookingEvent, EventPayload};
pub use query::{Page, PaginatedResponse};
