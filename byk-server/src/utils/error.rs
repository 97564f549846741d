//! Error handling at the HTTP boundary
//!
//! Re-exports the unified envelope from `shared::error` and provides the
//! success helpers used by every handler.
//!
//! ```ignore
//! // error
//! Err(AppError::not_found("Reservation RES-20240601-ABC123"))
//!
//! // success
//! Ok(ok(reservation))
//! ```

use axum::Json;
use serde::Serialize;

pub use shared::error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

/// Wrap data in a success envelope
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Wrap data in a success envelope with a custom message
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success_with_message(message, data))
}
