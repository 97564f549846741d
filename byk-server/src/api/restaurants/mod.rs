//! Restaurant table and availability API

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/restaurants", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/{restaurant_id}/tables", get(handler::list_tables))
        .route("/{restaurant_id}/availability", get(handler::availability))
}
