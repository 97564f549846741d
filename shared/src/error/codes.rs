//! Unified error codes for the Byk booking core
//!
//! This module defines all error codes returned by the booking server.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 6xxx: Cart errors
//! - 7xxx: Table / reservation errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, Swift clients).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Requested status change is not the next step of the order lifecycle
    OrderInvalidTransition = 4002,
    /// Delivery orders need an address
    OrderDeliveryAddressRequired = 4003,

    // ==================== 6xxx: Cart ====================
    /// Checkout attempted with no lines
    CartEmpty = 6001,
    /// Cart already holds dishes from another restaurant
    CartConflictingRestaurant = 6002,
    /// Dish price is negative, too large or finer than the currency unit
    CartInvalidPrice = 6003,
    /// Line quantity exceeds the per-line cap
    CartQuantityOutOfRange = 6004,

    // ==================== 7xxx: Table / Reservation ====================
    /// Table not found
    TableNotFound = 7001,
    /// Table already booked for an overlapping window
    TableConflict = 7002,
    /// Table capacity below party size
    TableTooSmall = 7003,
    /// Table belongs to another restaurant
    TableWrongRestaurant = 7004,
    /// Reservation not found
    ReservationNotFound = 7101,
    /// Requested status change is not allowed for the reservation
    ReservationInvalidTransition = 7102,
    /// Party size outside the accepted range
    ReservationPartySizeInvalid = 7103,
    /// Requested start lies in the past
    ReservationInPast = 7104,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderInvalidTransition => "Order status change is not allowed",
            ErrorCode::OrderDeliveryAddressRequired => "Delivery address is required",

            // Cart
            ErrorCode::CartEmpty => "Cart is empty",
            ErrorCode::CartConflictingRestaurant => {
                "Cart holds dishes from another restaurant, clear it first"
            }
            ErrorCode::CartInvalidPrice => "Dish price is invalid",
            ErrorCode::CartQuantityOutOfRange => "Quantity is out of range",

            // Table / Reservation
            ErrorCode::TableNotFound => "Table not found",
            ErrorCode::TableConflict => "Table just became unavailable, choose another",
            ErrorCode::TableTooSmall => "Table is too small for the party",
            ErrorCode::TableWrongRestaurant => "Table belongs to another restaurant",
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::ReservationInvalidTransition => "Reservation status change is not allowed",
            ErrorCode::ReservationPartySizeInvalid => "Party size is out of range",
            ErrorCode::ReservationInPast => "Cannot book a table in the past",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error returned when converting an unknown `u16` into an [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderInvalidTransition),
            4003 => Ok(ErrorCode::OrderDeliveryAddressRequired),

            // Cart
            6001 => Ok(ErrorCode::CartEmpty),
            6002 => Ok(ErrorCode::CartConflictingRestaurant),
            6003 => Ok(ErrorCode::CartInvalidPrice),
            6004 => Ok(ErrorCode::CartQuantityOutOfRange),

            // Table / Reservation
            7001 => Ok(ErrorCode::TableNotFound),
            7002 => Ok(ErrorCode::TableConflict),
            7003 => Ok(ErrorCode::TableTooSmall),
            7004 => Ok(ErrorCode::TableWrongRestaurant),
            7101 => Ok(ErrorCode::ReservationNotFound),
            7102 => Ok(ErrorCode::ReservationInvalidTransition),
            7103 => Ok(ErrorCode::ReservationPartySizeInvalid),
            7104 => Ok(ErrorCode::ReservationInPast),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
