//! Core module: configuration, shared state, server and error taxonomy
//!
//! - [`Config`] - environment-driven configuration
//! - [`ServerState`] - storage and lifecycle managers shared by handlers
//! - [`Server`] - HTTP server
//! - [`BookingError`] - domain errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;

pub use config::Config;
pub use error::{BookingError, BookingResult};
pub use server::Server;
pub use state::ServerState;
