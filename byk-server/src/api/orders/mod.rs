//! Order API Module
//!
//! Checkout turns the session cart into an order; status changes after that
//! go through the order lifecycle manager.

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/orders", routes())
        .route("/api/admin/orders", get(handler::list_all))
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/checkout", post(handler::checkout))
        .route("/my", get(handler::list_mine))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/advance", post(handler::advance))
        .route("/{id}/cancel", post(handler::cancel))
}
