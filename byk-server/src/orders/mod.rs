//! Order fulfillment
//!
//! Orders are created from a session cart at checkout with frozen lines and
//! total, then advance one status at a time or get cancelled.

pub mod manager;

#[cfg(test)]
mod tests;

pub use manager::{CheckoutOutcome, OrdersManager};
