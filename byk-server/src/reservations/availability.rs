//! Availability engine
//!
//! Finds tables that can take a party in a given window and performs the
//! atomic check-then-assign that creates a table binding.
//!
//! Windows are `[start, start + D)` in minutes. A window that runs past
//! midnight is compared against bindings of the following date, and one
//! starting early is compared against the tail of the previous date.

use chrono::{NaiveDate, NaiveTime};
use redb::WriteTransaction;
use shared::models::DiningTable;

use super::BookingPolicy;
use crate::core::error::{BookingError, BookingResult, Entity, ValidationError};
use crate::storage::{Binding, BookingStorage, StorageResult};
use crate::utils::time::minute_of_day;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// `[t1, t1+d)` and `[t2, t2+d)` share an instant
pub fn windows_overlap(t1: i64, t2: i64, d: i64) -> bool {
    t1 < t2 + d && t2 < t1 + d
}

/// Parameters of one check-then-assign
#[derive(Debug, Clone)]
pub struct AssignRequest {
    pub restaurant_id: String,
    pub table_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Reservation the binding will point at
    pub reservation_id: String,
    /// When set, tables seating fewer are rejected
    pub party_size: Option<i32>,
}

#[derive(Clone)]
pub struct AvailabilityEngine {
    storage: BookingStorage,
    policy: BookingPolicy,
}

impl std::fmt::Debug for AvailabilityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityEngine")
            .field("storage", &"<BookingStorage>")
            .field("policy", &self.policy)
            .finish()
    }
}

impl AvailabilityEngine {
    pub fn new(storage: BookingStorage, policy: BookingPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn slot_minutes(&self) -> u32 {
        self.policy.slot_duration_minutes
    }

    /// Tables of `restaurant_id` that seat `party_size` and are free for the window
    ///
    /// Ordered by capacity, then table number. An empty list is a normal
    /// outcome.
    pub fn find_candidates(
        &self,
        restaurant_id: &str,
        party_size: i32,
        date: NaiveDate,
        time: NaiveTime,
    ) -> BookingResult<Vec<DiningTable>> {
        self.policy.check_party_size(party_size)?;

        let start = minute_of_day(time) as i64;
        let mut candidates = Vec::new();
        for table in self.storage.list_tables(restaurant_id)? {
            if !table.fits(party_size) {
                continue;
            }
            let conflict = self.find_conflict(date, start, None, |day| {
                self.storage.bindings_for(table.id, day)
            })?;
            if conflict.is_none() {
                candidates.push(table);
            }
        }

        candidates.sort_by_key(|t| (t.capacity, t.number));
        tracing::debug!(
            restaurant_id = %restaurant_id,
            party_size,
            %date,
            %time,
            count = candidates.len(),
            "Computed table candidates"
        );
        Ok(candidates)
    }

    /// Check-then-assign in its own write transaction
    pub fn assign(&self, request: &AssignRequest) -> BookingResult<Binding> {
        let txn = self.storage.begin_write()?;
        let binding = self.assign_in(&txn, request)?;
        txn.commit().map_err(crate::storage::StorageError::from)?;
        Ok(binding)
    }

    /// Check-then-assign inside the caller's write transaction
    ///
    /// The overlap re-check and the binding insert happen under the same
    /// redb writer lock, so two racing assigns for one window cannot both
    /// pass the check. Nothing is visible to others until `txn` commits.
    pub fn assign_in(
        &self,
        txn: &WriteTransaction,
        request: &AssignRequest,
    ) -> BookingResult<Binding> {
        let table = self
            .storage
            .get_table_txn(txn, request.table_id)?
            .ok_or_else(|| BookingError::not_found(Entity::Table, request.table_id.to_string()))?;

        if table.restaurant_id != request.restaurant_id {
            return Err(ValidationError::TableWrongRestaurant {
                table_id: table.id,
                restaurant_id: request.restaurant_id.clone(),
            }
            .into());
        }
        if let Some(party_size) = request.party_size
            && !table.fits(party_size)
        {
            return Err(ValidationError::TableTooSmall {
                table_id: table.id,
                capacity: table.capacity,
                party_size,
            }
            .into());
        }

        let start = minute_of_day(request.time);
        let conflict = self.find_conflict(
            request.date,
            start as i64,
            Some(&request.reservation_id),
            |day| self.storage.bindings_for_txn(txn, table.id, day),
        )?;

        if let Some(existing) = conflict {
            tracing::info!(
                table_id = table.id,
                date = %request.date,
                time = %request.time,
                conflicting_reservation = %existing.reservation_id,
                "Table conflict on assign"
            );
            return Err(BookingError::TableConflict {
                table_id: table.id,
                date: request.date,
                time: request.time,
            });
        }

        let binding = Binding {
            table_id: table.id,
            date: request.date,
            start_minute: start,
            reservation_id: request.reservation_id.clone(),
        };
        self.storage.insert_binding(txn, &binding)?;

        tracing::debug!(
            table_id = table.id,
            date = %request.date,
            start_minute = start,
            reservation_id = %request.reservation_id,
            "Table binding created"
        );
        Ok(binding)
    }

    /// Remove a binding inside the caller's write transaction
    pub fn release_in(&self, txn: &WriteTransaction, binding: &Binding) -> BookingResult<bool> {
        let removed =
            self.storage
                .remove_binding(txn, binding.table_id, binding.date, binding.start_minute)?;
        if removed {
            tracing::debug!(
                table_id = binding.table_id,
                date = %binding.date,
                start_minute = binding.start_minute,
                "Table binding released"
            );
        }
        Ok(removed)
    }

    /// Bindings of one table on one date, ordered by start
    pub fn bookings_for(&self, table_id: i64, date: NaiveDate) -> BookingResult<Vec<Binding>> {
        Ok(self.storage.bindings_for(table_id, date)?)
    }

    /// First binding overlapping `[start, start + D)` on `date`, looking at
    /// as many neighbouring dates as a window of length D can reach
    fn find_conflict(
        &self,
        date: NaiveDate,
        start: i64,
        exclude_reservation: Option<&str>,
        mut fetch: impl FnMut(NaiveDate) -> StorageResult<Vec<Binding>>,
    ) -> StorageResult<Option<Binding>> {
        let d = self.slot_minutes() as i64;
        let reach = (d + MINUTES_PER_DAY - 1) / MINUTES_PER_DAY;

        for k in -reach..=reach {
            let Some(day) = date.checked_add_signed(chrono::Duration::days(k)) else {
                continue;
            };
            let offset = k * MINUTES_PER_DAY;
            for binding in fetch(day)? {
                if exclude_reservation == Some(binding.reservation_id.as_str()) {
                    continue;
                }
                if windows_overlap(start, binding.start_minute as i64 + offset, d) {
                    return Ok(Some(binding));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> BookingPolicy {
        BookingPolicy {
            slot_duration_minutes: 120,
            ..BookingPolicy::default()
        }
    }

    fn setup() -> (BookingStorage, AvailabilityEngine) {
        let storage = BookingStorage::open_in_memory().unwrap();
        storage
            .seed_tables(&[
                DiningTable {
                    id: 5,
                    restaurant_id: "r1".into(),
                    number: 5,
                    capacity: 4,
                    location: None,
                },
                DiningTable {
                    id: 6,
                    restaurant_id: "r1".into(),
                    number: 6,
                    capacity: 2,
                    location: Some("Terrace".into()),
                },
                DiningTable {
                    id: 7,
                    restaurant_id: "r1".into(),
                    number: 1,
                    capacity: 4,
                    location: None,
                },
                DiningTable {
                    id: 8,
                    restaurant_id: "r2".into(),
                    number: 1,
                    capacity: 8,
                    location: None,
                },
            ])
            .unwrap();
        let engine = AvailabilityEngine::new(storage.clone(), policy());
        (storage, engine)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn request(table_id: i64, date: NaiveDate, time: NaiveTime, reservation: &str) -> AssignRequest {
        AssignRequest {
            restaurant_id: "r1".into(),
            table_id,
            date,
            time,
            reservation_id: reservation.into(),
            party_size: None,
        }
    }

    #[test]
    fn test_windows_overlap_boundaries() {
        assert!(windows_overlap(1140, 1200, 120));
        assert!(windows_overlap(1200, 1140, 120));
        assert!(!windows_overlap(1140, 1260, 120));
        assert!(!windows_overlap(1260, 1140, 120));
        assert!(windows_overlap(1140, 1140, 120));
    }

    #[test]
    fn test_assign_overlap_scenario() {
        let (_storage, engine) = setup();
        engine.assign(&request(5, date(), at(19, 0), "a")).unwrap();

        let err = engine.assign(&request(5, date(), at(20, 0), "b")).unwrap_err();
        assert!(matches!(err, BookingError::TableConflict { table_id: 5, .. }));

        engine.assign(&request(5, date(), at(21, 0), "c")).unwrap();
        engine.assign(&request(5, date(), at(17, 0), "d")).unwrap();
        assert!(engine.assign(&request(5, date(), at(16, 0), "e")).is_err());
    }

    #[test]
    fn test_assign_same_reservation_is_not_a_conflict_with_itself() {
        let (_storage, engine) = setup();
        engine.assign(&request(5, date(), at(19, 0), "a")).unwrap();
        // same key re-inserted for the same reservation
        engine.assign(&request(5, date(), at(19, 0), "a")).unwrap();
        assert_eq!(engine.bookings_for(5, date()).unwrap().len(), 1);
    }

    #[test]
    fn test_window_across_midnight() {
        let (_storage, engine) = setup();
        engine.assign(&request(5, date(), at(23, 0), "late")).unwrap();

        let next_day = date().succ_opt().unwrap();
        let err = engine.assign(&request(5, next_day, at(0, 30), "early")).unwrap_err();
        assert!(matches!(err, BookingError::TableConflict { .. }));
        engine.assign(&request(5, next_day, at(1, 0), "ok")).unwrap();
    }

    #[test]
    fn test_slot_longer_than_a_day_reaches_further_dates() {
        let (storage, _) = setup();
        let engine = AvailabilityEngine::new(
            storage,
            BookingPolicy {
                slot_duration_minutes: 3000,
                ..BookingPolicy::default()
            },
        );
        engine.assign(&request(5, date(), at(0, 0), "first")).unwrap();

        // [0, 3000) and [2880, 5880) share the start of the third day
        let two_days_later = date() + chrono::Days::new(2);
        let err = engine
            .assign(&request(5, two_days_later, at(0, 0), "second"))
            .unwrap_err();
        assert!(matches!(err, BookingError::TableConflict { .. }));
        let free = engine
            .find_candidates("r1", 4, two_days_later, at(0, 0))
            .unwrap();
        assert!(free.iter().all(|t| t.id != 5));

        // exactly D minutes later the windows only touch
        engine
            .assign(&request(5, two_days_later, at(2, 0), "third"))
            .unwrap();

        // and the reach works backwards too
        let err = engine
            .assign(&request(5, date() - chrono::Days::new(2), at(1, 0), "before"))
            .unwrap_err();
        assert!(matches!(err, BookingError::TableConflict { .. }));
    }

    #[test]
    fn test_assign_rejects_foreign_unknown_and_small_tables() {
        let (_storage, engine) = setup();

        let err = engine.assign(&request(8, date(), at(19, 0), "a")).unwrap_err();
        assert!(matches!(
            err,
            BookingError::Validation(ValidationError::TableWrongRestaurant { .. })
        ));

        let err = engine.assign(&request(99, date(), at(19, 0), "a")).unwrap_err();
        assert!(matches!(err, BookingError::NotFound { entity: Entity::Table, .. }));

        let mut req = request(6, date(), at(19, 0), "a");
        req.party_size = Some(3);
        let err = engine.assign(&req).unwrap_err();
        assert!(matches!(
            err,
            BookingError::Validation(ValidationError::TableTooSmall { capacity: 2, .. })
        ));
    }

    #[test]
    fn test_find_candidates_order_and_capacity() {
        let (_storage, engine) = setup();
        let tables = engine.find_candidates("r1", 2, date(), at(19, 0)).unwrap();
        let ids: Vec<_> = tables.iter().map(|t| t.id).collect();
        // capacity asc, then number asc
        assert_eq!(ids, vec![6, 7, 5]);

        let tables = engine.find_candidates("r1", 3, date(), at(19, 0)).unwrap();
        assert!(tables.iter().all(|t| t.capacity >= 3));
        assert_eq!(tables.len(), 2);

        assert!(engine.find_candidates("r1", 9, date(), at(19, 0)).unwrap().is_empty());
    }

    #[test]
    fn test_find_candidates_excludes_booked_tables() {
        let (_storage, engine) = setup();
        engine.assign(&request(7, date(), at(19, 0), "a")).unwrap();

        let ids: Vec<_> = engine
            .find_candidates("r1", 4, date(), at(20, 30))
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![5]);

        let ids: Vec<_> = engine
            .find_candidates("r1", 4, date(), at(21, 0))
            .unwrap()
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![7, 5]);
    }

    #[test]
    fn test_find_candidates_rejects_bad_party_size() {
        let (_storage, engine) = setup();
        let err = engine.find_candidates("r1", 0, date(), at(19, 0)).unwrap_err();
        assert!(matches!(
            err,
            BookingError::Validation(ValidationError::PartySize { .. })
        ));
    }

    #[test]
    fn test_release_in() {
        let (storage, engine) = setup();
        let binding = engine.assign(&request(5, date(), at(19, 0), "a")).unwrap();

        let txn = storage.begin_write().unwrap();
        assert!(engine.release_in(&txn, &binding).unwrap());
        txn.commit().unwrap();

        engine.assign(&request(5, date(), at(20, 0), "b")).unwrap();
    }
}
