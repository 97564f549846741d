//! Domain error taxonomy shared by the cart, availability and lifecycle components

use chrono::{NaiveDate, NaiveTime};
use shared::error::{AppError, ErrorCode};
use std::fmt;
use thiserror::Error;

use crate::storage::StorageError;

pub type BookingResult<T> = Result<T, BookingError>;

/// Record kinds addressed by id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Table,
    Reservation,
    Order,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Entity::Table => "Table",
            Entity::Reservation => "Reservation",
            Entity::Order => "Order",
        })
    }
}

/// Input rejected before any state changed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("party size must be between 1 and {max}, got {party_size}")]
    PartySize { party_size: i32, max: i32 },

    #[error("requested start {date} {time} is in the past")]
    InPast { date: NaiveDate, time: NaiveTime },

    #[error("special requests exceed {max} characters")]
    SpecialRequestsTooLong { max: usize },

    #[error("cart is empty")]
    EmptyCart,

    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("quantity must be between 1 and {max}, got {quantity}")]
    Quantity { quantity: i32, max: i32 },

    #[error("delivery orders need a delivery address")]
    DeliveryAddressRequired,

    #[error("table {table_id} seats {capacity}, party is {party_size}")]
    TableTooSmall {
        table_id: i64,
        capacity: i32,
        party_size: i32,
    },

    #[error("table {table_id} does not belong to restaurant {restaurant_id}")]
    TableWrongRestaurant { table_id: i64, restaurant_id: String },

    #[error("{0}")]
    Field(String),
}

impl ValidationError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ValidationError::PartySize { .. } => ErrorCode::ReservationPartySizeInvalid,
            ValidationError::InPast { .. } => ErrorCode::ReservationInPast,
            ValidationError::SpecialRequestsTooLong { .. } => ErrorCode::ValueOutOfRange,
            ValidationError::EmptyCart => ErrorCode::CartEmpty,
            ValidationError::InvalidPrice(_) => ErrorCode::CartInvalidPrice,
            ValidationError::Quantity { .. } => ErrorCode::CartQuantityOutOfRange,
            ValidationError::DeliveryAddressRequired => ErrorCode::OrderDeliveryAddressRequired,
            ValidationError::TableTooSmall { .. } => ErrorCode::TableTooSmall,
            ValidationError::TableWrongRestaurant { .. } => ErrorCode::TableWrongRestaurant,
            ValidationError::Field(_) => ErrorCode::ValidationFailed,
        }
    }
}

/// Errors returned by every booking-core operation
///
/// Each operation is all-or-nothing: when one of these is returned, nothing
/// was written.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Cart holds dishes from restaurant {current}, cannot add from {requested}")]
    ConflictingRestaurant { current: String, requested: String },

    #[error("Table {table_id} is already booked around {date} {time}")]
    TableConflict {
        table_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    },

    #[error("{entity} {id} cannot move from {from} to {to}")]
    InvalidTransition {
        entity: Entity,
        id: String,
        from: String,
        to: String,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookingError {
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid_transition(
        entity: Entity,
        id: impl Into<String>,
        from: impl fmt::Display,
        to: impl fmt::Display,
    ) -> Self {
        Self::InvalidTransition {
            entity,
            id: id.into(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            BookingError::Validation(v) => v.code(),
            BookingError::ConflictingRestaurant { .. } => ErrorCode::CartConflictingRestaurant,
            BookingError::TableConflict { .. } => ErrorCode::TableConflict,
            BookingError::InvalidTransition { entity, .. } => match entity {
                Entity::Order => ErrorCode::OrderInvalidTransition,
                Entity::Reservation | Entity::Table => ErrorCode::ReservationInvalidTransition,
            },
            BookingError::NotFound { entity, .. } => match entity {
                Entity::Table => ErrorCode::TableNotFound,
                Entity::Reservation => ErrorCode::ReservationNotFound,
                Entity::Order => ErrorCode::OrderNotFound,
            },
            BookingError::Storage(_) => ErrorCode::DatabaseError,
            BookingError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let code = err.code();
        match err {
            BookingError::Storage(e) => {
                tracing::error!(error = %e, error_code = %code, "Storage error occurred");
                AppError::with_message(code, "Storage unavailable, try again")
            }
            BookingError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error occurred");
                AppError::with_message(code, msg)
            }
            BookingError::NotFound { entity, id } => {
                tracing::warn!(entity = %entity, id = %id, "Record not found");
                AppError::with_message(code, format!("{} not found: {}", entity, id))
                    .with_detail("id", id)
            }
            BookingError::InvalidTransition {
                entity,
                id,
                from,
                to,
            } => {
                tracing::warn!(entity = %entity, id = %id, from = %from, to = %to, "Invalid status transition");
                AppError::with_message(
                    code,
                    format!("{} {} cannot move from {} to {}", entity, id, from, to),
                )
                .with_detail("from", from)
                .with_detail("to", to)
            }
            BookingError::TableConflict {
                table_id,
                date,
                time,
            } => AppError::new(code)
                .with_detail("table_id", table_id)
                .with_detail("date", date.to_string())
                .with_detail("time", time.format("%H:%M").to_string()),
            BookingError::ConflictingRestaurant { current, requested } => AppError::new(code)
                .with_detail("cart_restaurant_id", current)
                .with_detail("requested_restaurant_id", requested),
            BookingError::Validation(v) => AppError::with_message(code, v.to_string()),
        }
    }
}
