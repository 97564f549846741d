//! Reservation lifecycle manager
//!
//! Owns reservation records. Every state change runs in one redb write
//! transaction and emits a [`BookingEvent`] after it commits.
//!
//! ```text
//! create ──► pending ──confirm──► confirmed
//!               │                     │
//!               └──────cancel─────────┴──► cancelled
//! ```

use chrono::{NaiveTime, Timelike};
use shared::models::{Reservation, ReservationCreate, ReservationStats, ReservationStatus};
use shared::query::{Page, PaginatedResponse};
use shared::{BookingEvent, EventPayload};
use std::sync::Arc;
use tokio::sync::broadcast;

use super::availability::{AssignRequest, AvailabilityEngine};
use super::{BookingPolicy, number};
use crate::core::error::{BookingError, BookingResult, Entity, ValidationError};
use crate::storage::{Binding, BookingStorage, StorageError};
use crate::utils::time::{Clock, local_now, minute_of_day};

/// Longest accepted special-requests text (characters)
pub const MAX_SPECIAL_REQUESTS_CHARS: usize = 500;

/// Attempts at drawing an unused reservation number
const MAX_NUMBER_ATTEMPTS: usize = 8;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

pub struct ReservationsManager {
    storage: BookingStorage,
    engine: AvailabilityEngine,
    policy: BookingPolicy,
    clock: Arc<dyn Clock>,
    event_tx: broadcast::Sender<BookingEvent>,
}

impl std::fmt::Debug for ReservationsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationsManager")
            .field("storage", &"<BookingStorage>")
            .field("policy", &self.policy)
            .field("event_tx", &"<broadcast::Sender>")
            .finish()
    }
}

impl ReservationsManager {
    pub fn new(storage: BookingStorage, policy: BookingPolicy, clock: Arc<dyn Clock>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            engine: AvailabilityEngine::new(storage.clone(), policy),
            storage,
            policy,
            clock,
            event_tx,
        }
    }

    pub fn engine(&self) -> &AvailabilityEngine {
        &self.engine
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Subscribe to reservation events
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.event_tx.subscribe()
    }

    // ========== Commands ==========

    /// Create a pending reservation without a table
    pub fn create(&self, customer_id: &str, input: ReservationCreate) -> BookingResult<Reservation> {
        self.policy.check_party_size(input.party_size)?;

        let time = truncate_to_minute(input.time);
        let now = local_now(self.clock.as_ref(), self.policy.timezone);
        if input.date.and_time(time) < now {
            return Err(ValidationError::InPast {
                date: input.date,
                time,
            }
            .into());
        }

        let special_requests = non_empty(input.special_requests);
        if let Some(text) = &special_requests
            && text.chars().count() > MAX_SPECIAL_REQUESTS_CHARS
        {
            return Err(ValidationError::SpecialRequestsTooLong {
                max: MAX_SPECIAL_REQUESTS_CHARS,
            }
            .into());
        }
        if input.restaurant_id.trim().is_empty() {
            return Err(ValidationError::Field("restaurant_id is required".into()).into());
        }

        let id = uuid::Uuid::new_v4().to_string();
        let created_at = self.clock.now();

        let txn = self.storage.begin_write()?;
        let reservation_number = self.claim_number(&txn, &id, now.date())?;

        let reservation = Reservation {
            id,
            reservation_number,
            restaurant_id: input.restaurant_id,
            customer_id: customer_id.to_string(),
            table_id: None,
            date: input.date,
            time,
            party_size: input.party_size,
            status: ReservationStatus::Pending,
            special_requests,
            contact_name: non_empty(input.contact_name),
            contact_phone: non_empty(input.contact_phone),
            cancel_reason: None,
            created_at,
            updated_at: created_at,
        };
        self.storage.put_reservation(&txn, &reservation)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            reservation_id = %reservation.id,
            reservation_number = %reservation.reservation_number,
            restaurant_id = %reservation.restaurant_id,
            party_size = reservation.party_size,
            "Reservation created"
        );
        self.emit(EventPayload::ReservationCreated {
            reservation_id: reservation.id.clone(),
            reservation_number: reservation.reservation_number.clone(),
            restaurant_id: reservation.restaurant_id.clone(),
        });
        Ok(reservation)
    }

    /// Assign `table_id` and move the reservation to confirmed
    ///
    /// On `TableConflict` the reservation stays pending; no retry happens here.
    pub fn confirm(&self, reservation_id: &str, table_id: i64) -> BookingResult<Reservation> {
        let txn = self.storage.begin_write()?;
        let mut reservation = self
            .storage
            .get_reservation_txn(&txn, reservation_id)?
            .ok_or_else(|| BookingError::not_found(Entity::Reservation, reservation_id))?;

        if reservation.status != ReservationStatus::Pending {
            return Err(BookingError::invalid_transition(
                Entity::Reservation,
                reservation_id,
                reservation.status,
                ReservationStatus::Confirmed,
            ));
        }

        let request = AssignRequest {
            restaurant_id: reservation.restaurant_id.clone(),
            table_id,
            date: reservation.date,
            time: reservation.time,
            reservation_id: reservation.id.clone(),
            party_size: Some(reservation.party_size),
        };
        if let Err(e) = self.engine.assign_in(&txn, &request) {
            if matches!(e, BookingError::TableConflict { .. }) {
                tracing::warn!(
                    reservation_id = %reservation_id,
                    table_id,
                    "Confirm rejected, table taken"
                );
            }
            return Err(e);
        }

        reservation.status = ReservationStatus::Confirmed;
        reservation.table_id = Some(table_id);
        reservation.updated_at = self.clock.now();
        self.storage.put_reservation(&txn, &reservation)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            reservation_id = %reservation.id,
            table_id,
            status = %reservation.status,
            "Reservation confirmed"
        );
        self.emit(EventPayload::ReservationConfirmed {
            reservation_id: reservation.id.clone(),
            table_id,
        });
        Ok(reservation)
    }

    /// Cancel from pending or confirmed, releasing the table binding if held
    ///
    /// Cancelling a cancelled reservation returns it unchanged.
    pub fn cancel(&self, reservation_id: &str, reason: Option<String>) -> BookingResult<Reservation> {
        let txn = self.storage.begin_write()?;
        let mut reservation = self
            .storage
            .get_reservation_txn(&txn, reservation_id)?
            .ok_or_else(|| BookingError::not_found(Entity::Reservation, reservation_id))?;

        if reservation.status == ReservationStatus::Cancelled {
            tracing::debug!(reservation_id = %reservation_id, "Reservation already cancelled");
            return Ok(reservation);
        }

        let from = reservation.status;
        let mut released_table_id = None;
        if let Some(table_id) = reservation.table_id {
            let binding = Binding {
                table_id,
                date: reservation.date,
                start_minute: minute_of_day(reservation.time),
                reservation_id: reservation.id.clone(),
            };
            if self.engine.release_in(&txn, &binding)? {
                released_table_id = Some(table_id);
            }
        }

        reservation.status = ReservationStatus::Cancelled;
        reservation.cancel_reason = non_empty(reason);
        reservation.updated_at = self.clock.now();
        self.storage.put_reservation(&txn, &reservation)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            reservation_id = %reservation.id,
            from = %from,
            released_table_id = ?released_table_id,
            "Reservation cancelled"
        );
        self.emit(EventPayload::ReservationCancelled {
            reservation_id: reservation.id.clone(),
            from,
            released_table_id,
            reason: reservation.cancel_reason.clone(),
        });
        Ok(reservation)
    }

    // ========== Queries ==========

    pub fn get(&self, reservation_id: &str) -> BookingResult<Reservation> {
        self.storage
            .get_reservation(reservation_id)?
            .ok_or_else(|| BookingError::not_found(Entity::Reservation, reservation_id))
    }

    /// Owner-scoped read; another customer's reservation reads as not found
    pub fn get_for_customer(
        &self,
        customer_id: &str,
        reservation_id: &str,
    ) -> BookingResult<Reservation> {
        match self.storage.get_reservation(reservation_id)? {
            Some(r) if r.customer_id == customer_id => Ok(r),
            _ => Err(BookingError::not_found(Entity::Reservation, reservation_id)),
        }
    }

    /// A customer's reservations, newest first
    pub fn list_for_customer(
        &self,
        customer_id: &str,
        status: Option<ReservationStatus>,
        page: Page,
    ) -> BookingResult<PaginatedResponse<Reservation>> {
        self.query(page, |r| {
            r.customer_id == customer_id && status.is_none_or(|s| r.status == s)
        })
    }

    /// All reservations (admin), newest first
    pub fn list(
        &self,
        restaurant_id: Option<&str>,
        status: Option<ReservationStatus>,
        page: Page,
    ) -> BookingResult<PaginatedResponse<Reservation>> {
        self.query(page, |r| {
            restaurant_id.is_none_or(|id| r.restaurant_id == id)
                && status.is_none_or(|s| r.status == s)
        })
    }

    /// Counts per status
    pub fn status_summary(&self) -> BookingResult<ReservationStats> {
        let mut stats = ReservationStats::default();
        for r in self.storage.list_reservations()? {
            stats.record(r.status);
        }
        Ok(stats)
    }

    fn query(
        &self,
        page: Page,
        filter: impl Fn(&Reservation) -> bool,
    ) -> BookingResult<PaginatedResponse<Reservation>> {
        let mut items: Vec<_> = self
            .storage
            .list_reservations()?
            .into_iter()
            .filter(|r| filter(r))
            .collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.reservation_number.cmp(&a.reservation_number))
        });
        Ok(page.slice(items))
    }

    // ========== Internals ==========

    fn claim_number(
        &self,
        txn: &redb::WriteTransaction,
        reservation_id: &str,
        date: chrono::NaiveDate,
    ) -> BookingResult<String> {
        let mut rng = rand::thread_rng();
        for attempt in 1..=MAX_NUMBER_ATTEMPTS {
            let candidate = number::generate(date, &mut rng);
            if self
                .storage
                .claim_reservation_number(txn, &candidate, reservation_id)?
            {
                return Ok(candidate);
            }
            tracing::warn!(attempt, number = %candidate, "Reservation number collision");
        }
        Err(BookingError::Internal(
            "could not allocate a unique reservation number".into(),
        ))
    }

    fn emit(&self, payload: EventPayload) {
        let event = BookingEvent::new(self.clock.now().timestamp_millis(), payload);
        if self.event_tx.send(event).is_err() {
            tracing::trace!("Event broadcast skipped: no active receivers");
        }
    }
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
