//! Racing table assignments
//!
//! Many threads try to bind the same table and window at once; the redb
//! writer lock must let exactly one of them through.

use byk_server::BookingError;
use byk_server::BookingStorage;
use byk_server::reservations::{AssignRequest, AvailabilityEngine, BookingPolicy, ReservationsManager};
use byk_server::utils::time::FixedClock;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use shared::models::{DiningTable, ReservationCreate, ReservationStatus};
use std::sync::{Arc, Barrier};
use std::thread;

const RACERS: usize = 16;

fn seeded_storage() -> (tempfile::TempDir, BookingStorage) {
    let dir = tempfile::tempdir().unwrap();
    let storage = BookingStorage::open(dir.path().join("booking.redb")).unwrap();
    storage
        .seed_tables(&[DiningTable {
            id: 5,
            restaurant_id: "r1".into(),
            number: 5,
            capacity: 4,
            location: None,
        }])
        .unwrap();
    (dir, storage)
}

fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

#[test]
fn racing_assigns_admit_exactly_one() {
    let (_dir, storage) = seeded_storage();
    let engine = AvailabilityEngine::new(storage.clone(), BookingPolicy::default());
    let barrier = Arc::new(Barrier::new(RACERS));

    let handles: Vec<_> = (0..RACERS)
        .map(|i| {
            let engine = engine.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                let request = AssignRequest {
                    restaurant_id: "r1".into(),
                    table_id: 5,
                    date: june_first(),
                    // every racer wants an overlapping window
                    time: NaiveTime::from_hms_opt(19, (i % 4) as u32 * 10, 0).unwrap(),
                    reservation_id: format!("res-{}", i),
                    party_size: Some(2),
                };
                barrier.wait();
                engine.assign(&request)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(BookingError::TableConflict { table_id: 5, .. })))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(conflicts, RACERS - 1);
    assert_eq!(storage.count_bindings().unwrap(), 1);
}

#[test]
fn racing_confirms_leave_one_confirmed() {
    let (_dir, storage) = seeded_storage();
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
    ));
    let manager = Arc::new(ReservationsManager::new(
        storage.clone(),
        BookingPolicy::default(),
        clock,
    ));

    let ids: Vec<String> = (0..RACERS)
        .map(|i| {
            manager
                .create(
                    &format!("c-{}", i),
                    ReservationCreate {
                        restaurant_id: "r1".into(),
                        party_size: 4,
                        date: june_first(),
                        time: NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
                        special_requests: None,
                        contact_name: None,
                        contact_phone: None,
                    },
                )
                .unwrap()
                .id
        })
        .collect();

    let barrier = Arc::new(Barrier::new(RACERS));
    let handles: Vec<_> = ids
        .iter()
        .cloned()
        .map(|id| {
            let manager = manager.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                manager.confirm(&id, 5)
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|r| r.is_ok())
        .count();
    assert_eq!(successes, 1);

    let confirmed = ids
        .iter()
        .filter(|id| manager.get(id).unwrap().status == ReservationStatus::Confirmed)
        .count();
    assert_eq!(confirmed, 1);
    assert_eq!(storage.count_bindings().unwrap(), 1);
}
