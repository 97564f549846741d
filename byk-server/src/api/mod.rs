//! API routes
//!
//! - [`health`] - liveness
//! - [`restaurants`] - tables and availability
//! - [`cart`] - session cart
//! - [`reservations`] - reservation lifecycle and admin listings
//! - [`orders`] - checkout, order lifecycle and admin listings

pub mod cart;
pub mod extract;
pub mod health;
pub mod orders;
pub mod reservations;
pub mod restaurants;

use axum::{Router, middleware};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::core::ServerState;

/// HTTP request log middleware
async fn log_request(
    request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        target: "http_access",
        "{} {} {} {}ms",
        method,
        uri,
        response.status(),
        started.elapsed().as_millis()
    );
    response
}

/// All routes, before state is attached
pub fn routes() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(restaurants::router())
        .merge(cart::router())
        .merge(reservations::router())
        .merge(orders::router())
}

/// Build the application router with state and middleware
pub fn build_app(state: ServerState) -> Router {
    routes()
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(log_request))
}
