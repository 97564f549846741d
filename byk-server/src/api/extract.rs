//! Caller identity extractors
//!
//! Identity comes from an upstream session provider and is trusted as is:
//! `x-customer-id` names the customer, `x-session-id` the cart session.

use axum::extract::FromRequestParts;
use http::request::Parts;

use crate::utils::AppError;

pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Customer making the request
#[derive(Debug, Clone)]
pub struct CustomerId(pub String);

/// Cart session of the request
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for CustomerId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(parts, CUSTOMER_ID_HEADER).map(CustomerId)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(parts, SESSION_ID_HEADER).map(SessionId)
    }
}

fn header_value(parts: &Parts, name: &'static str) -> Result<String, AppError> {
    let value = parts
        .headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match value {
        Some(v) => Ok(v.to_string()),
        None => {
            tracing::debug!(header = name, uri = %parts.uri, "Missing identity header");
            Err(AppError::required(name))
        }
    }
}
