//! Property: random confirm/cancel sequences never leave two active
//! reservations on one table with overlapping windows, midnight included.

use byk_server::reservations::{BookingPolicy, ReservationsManager, windows_overlap};
use byk_server::utils::time::{FixedClock, minute_of_day};
use byk_server::BookingStorage;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use proptest::prelude::*;
use shared::models::{DiningTable, ReservationCreate, ReservationStatus};
use shared::query::{MAX_PAGE_SIZE, Page};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Book { table_id: i64, day: u32, slot: u32 },
    Cancel { pick: usize },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (1i64..=2, 0u32..3, 0u32..96).prop_map(|(table_id, day, slot)| Op::Book { table_id, day, slot }),
        1 => any::<usize>().prop_map(|pick| Op::Cancel { pick }),
    ]
}

fn manager() -> ReservationsManager {
    let storage = BookingStorage::open_in_memory().unwrap();
    storage
        .seed_tables(&[1, 2].map(|id| DiningTable {
            id,
            restaurant_id: "r1".into(),
            number: id as i32,
            capacity: 4,
            location: None,
        }))
        .unwrap();
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    ));
    ReservationsManager::new(storage, BookingPolicy::default(), clock)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn active_windows_never_overlap(ops in prop::collection::vec(op(), 1..40)) {
        let manager = manager();
        let base = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let mut created: Vec<String> = Vec::new();

        for op in ops {
            match op {
                Op::Book { table_id, day, slot } => {
                    let minute = slot * 15;
                    let r = manager
                        .create("c", ReservationCreate {
                            restaurant_id: "r1".into(),
                            party_size: 2,
                            date: base + chrono::Days::new(day as u64),
                            time: NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).unwrap(),
                            special_requests: None,
                            contact_name: None,
                            contact_phone: None,
                        })
                        .unwrap();
                    let _ = manager.confirm(&r.id, table_id);
                    created.push(r.id);
                }
                Op::Cancel { pick } => {
                    if !created.is_empty() {
                        let id = &created[pick % created.len()];
                        prop_assert!(manager.cancel(id, None).is_ok());
                    }
                }
            }
        }

        let confirmed = manager
            .list(None, Some(ReservationStatus::Confirmed), Page::new(Some(1), Some(MAX_PAGE_SIZE)))
            .unwrap()
            .data;
        let d = manager.engine().slot_minutes() as i64;
        let absolute = |date: NaiveDate, time: NaiveTime| {
            (date - base).num_days() * 1440 + minute_of_day(time) as i64
        };

        for (i, a) in confirmed.iter().enumerate() {
            for b in &confirmed[i + 1..] {
                if a.table_id == b.table_id {
                    prop_assert!(!windows_overlap(absolute(a.date, a.time), absolute(b.date, b.time), d));
                }
            }
        }

        let mut bindings = 0;
        for table_id in [1, 2] {
            for day in 0..3 {
                bindings += manager
                    .engine()
                    .bookings_for(table_id, base + chrono::Days::new(day))
                    .unwrap()
                    .len();
            }
        }
        prop_assert_eq!(bindings, confirmed.len());
    }
}
