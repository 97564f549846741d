//! Utility module
//!
//! - [`AppError`] / [`ApiResponse`] - response envelope (from shared::error)
//! - [`logger`] - tracing subscriber setup
//! - [`time`] - clock and slot helpers

pub mod error;
pub mod logger;
pub mod time;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
pub use error::{ok, ok_with_message};
