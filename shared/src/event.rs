//! Lifecycle events - immutable facts emitted after a state transition commits

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{OrderStatus, ReservationStatus};

/// Event envelope broadcast by the lifecycle managers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingEvent {
    /// Event unique ID
    pub event_id: String,
    /// Server timestamp (Unix milliseconds)
    pub timestamp: i64,
    pub payload: EventPayload,
}

impl BookingEvent {
    pub fn new(timestamp: i64, payload: EventPayload) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp,
            payload,
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}

/// Event payload variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    // ========== Reservations ==========
    ReservationCreated {
        reservation_id: String,
        reservation_number: String,
        restaurant_id: String,
    },
    ReservationConfirmed {
        reservation_id: String,
        table_id: i64,
    },
    ReservationCancelled {
        reservation_id: String,
        /// Status before the cancel
        from: ReservationStatus,
        /// Table whose binding was released, if one was held
        #[serde(skip_serializing_if = "Option::is_none")]
        released_table_id: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    // ========== Orders ==========
    OrderPlaced {
        order_id: String,
        order_number: String,
        restaurant_id: String,
        total_amount: Decimal,
    },
    OrderAdvanced {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },
    OrderCancelled {
        order_id: String,
        from: OrderStatus,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> &'static str {
        match self {
            EventPayload::ReservationCreated { .. } => "RESERVATION_CREATED",
            EventPayload::ReservationConfirmed { .. } => "RESERVATION_CONFIRMED",
            EventPayload::ReservationCancelled { .. } => "RESERVATION_CANCELLED",
            EventPayload::OrderPlaced { .. } => "ORDER_PLACED",
            EventPayload::OrderAdvanced { .. } => "ORDER_ADVANCED",
            EventPayload::OrderCancelled { .. } => "ORDER_CANCELLED",
        }
    }
}
