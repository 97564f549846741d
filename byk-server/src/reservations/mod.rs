//! Table reservations
//!
//! - [`AvailabilityEngine`] - candidate search and atomic check-then-assign
//! - [`ReservationsManager`] - reservation lifecycle (pending → confirmed / cancelled)

pub mod availability;
pub mod manager;
pub mod number;


pub use availability::{AssignRequest, AvailabilityEngine, windows_overlap};
pub use manager::{MAX_SPECIAL_REQUESTS_CHARS, ReservationsManager};

use chrono_tz::Tz;

use crate::core::Config;
use crate::core::error::ValidationError;

/// Booking rules shared by the engine and the manager
#[derive(Debug, Clone, Copy)]
pub struct BookingPolicy {
    /// Fixed window length D
    pub slot_duration_minutes: u32,
    pub max_party_size: i32,
    /// Reservation date/time are local to this zone
    pub timezone: Tz,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            slot_duration_minutes: 120,
            max_party_size: 20,
            timezone: chrono_tz::UTC,
        }
    }
}

impl BookingPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            slot_duration_minutes: config.slot_duration_minutes,
            max_party_size: config.max_party_size,
            timezone: config.timezone,
        }
    }

    pub fn check_party_size(&self, party_size: i32) -> Result<(), ValidationError> {
        if party_size < 1 || party_size > self.max_party_size {
            return Err(ValidationError::PartySize {
                party_size,
                max: self.max_party_size,
            });
        }
        Ok(())
    }
}
