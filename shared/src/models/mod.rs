//! Data models
//!
//! Shared between byk-server and its HTTP clients.
//! Table ids are `i64` (catalog ids); reservation and order ids are UUID strings.

pub mod cart;
pub mod dining_table;
pub mod order;
pub mod reservation;

// Re-exports
pub use cart::*;
pub use dining_table::*;
pub use order::*;
pub use reservation::*;
