//! redb-based storage layer for the booking core
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `dining_tables` | `table_id` | `DiningTable` | Seeded catalog tables |
//! | `reservations` | `reservation_id` | `Reservation` | Reservation records |
//! | `reservation_numbers` | `number` | `reservation_id` | Number uniqueness index |
//! | `table_bookings` | `(table_id, date, start_minute)` | `reservation_id` | Table bindings |
//! | `carts` | `session_id` | `Cart` | Session carts |
//! | `orders` | `order_id` | `Order` | Order records |
//! | `order_numbers` | `number` | `order_id` | Number uniqueness index |
//! | `checkouts` | `cart_id` | `order_id` | Checkout idempotency |
//! | `counters` | `name` | `u64` | Monotonic counters |
//!
//! # Concurrency
//!
//! redb admits one write transaction at a time. Every read-check-write that
//! must be atomic (table assignment, checkout, status compare-and-set) runs
//! inside a single [`WriteTransaction`] obtained from [`BookingStorage::begin_write`].
//!
//! Methods taking `txn` never commit; the caller decides.

use chrono::NaiveDate;
use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use shared::models::{DiningTable, Order, Reservation};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::cart::Cart;
use crate::utils::time::date_key;

/// key = table_id, value = JSON-serialized DiningTable
const DINING_TABLES: TableDefinition<i64, &[u8]> = TableDefinition::new("dining_tables");

/// key = reservation_id, value = JSON-serialized Reservation
const RESERVATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("reservations");

/// key = reservation_number, value = reservation_id
const RESERVATION_NUMBERS: TableDefinition<&str, &str> =
    TableDefinition::new("reservation_numbers");

/// key = (table_id, YYYY-MM-DD, start minute of day), value = reservation_id
const TABLE_BOOKINGS: TableDefinition<(i64, &str, u32), &str> =
    TableDefinition::new("table_bookings");

/// key = session_id, value = JSON-serialized Cart
const CARTS: TableDefinition<&str, &[u8]> = TableDefinition::new("carts");

/// key = order_id, value = JSON-serialized Order
const ORDERS: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

/// key = order_number, value = order_id
const ORDER_NUMBERS: TableDefinition<&str, &str> = TableDefinition::new("order_numbers");

/// key = cart_id, value = order_id
const CHECKOUTS: TableDefinition<&str, &str> = TableDefinition::new("checkouts");

/// key = counter name, value = last issued value
const COUNTERS: TableDefinition<&str, u64> = TableDefinition::new("counters");

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A table-to-reservation binding row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub table_id: i64,
    pub date: NaiveDate,
    /// Slot start, minutes since midnight
    pub start_minute: u32,
    pub reservation_id: String,
}

/// Booking storage backed by redb
#[derive(Clone)]
pub struct BookingStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for BookingStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingStorage").finish_non_exhaustive()
    }
}

impl BookingStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: a commit is
    /// persistent as soon as `commit()` returns.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            // Create all tables if they don't exist
            let _ = write_txn.open_table(DINING_TABLES)?;
            let _ = write_txn.open_table(RESERVATIONS)?;
            let _ = write_txn.open_table(RESERVATION_NUMBERS)?;
            let _ = write_txn.open_table(TABLE_BOOKINGS)?;
            let _ = write_txn.open_table(CARTS)?;
            let _ = write_txn.open_table(ORDERS)?;
            let _ = write_txn.open_table(ORDER_NUMBERS)?;
            let _ = write_txn.open_table(CHECKOUTS)?;
            let _ = write_txn.open_table(COUNTERS)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Counters ==========

    /// Increment and return a named counter
    pub fn next_counter(&self, txn: &WriteTransaction, name: &str) -> StorageResult<u64> {
        let mut table = txn.open_table(COUNTERS)?;
        let current = table.get(name)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        table.insert(name, next)?;
        Ok(next)
    }

    // ========== Dining Tables ==========

    /// Insert or replace catalog tables, returns how many were written
    pub fn seed_tables(&self, tables: &[DiningTable]) -> StorageResult<usize> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DINING_TABLES)?;
            for t in tables {
                let value = serde_json::to_vec(t)?;
                table.insert(t.id, value.as_slice())?;
            }
        }
        txn.commit()?;
        Ok(tables.len())
    }

    pub fn get_table(&self, table_id: i64) -> StorageResult<Option<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DINING_TABLES)?;
        match table.get(table_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: i64,
    ) -> StorageResult<Option<DiningTable>> {
        let table = txn.open_table(DINING_TABLES)?;
        match table.get(table_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Tables of one restaurant, ordered by table number
    pub fn list_tables(&self, restaurant_id: &str) -> StorageResult<Vec<DiningTable>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DINING_TABLES)?;

        let mut tables = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            let t: DiningTable = serde_json::from_slice(value.value())?;
            if t.restaurant_id == restaurant_id {
                tables.push(t);
            }
        }
        tables.sort_by_key(|t| t.number);
        Ok(tables)
    }

    // ========== Table Bindings ==========

    /// Bindings of one table on one date (read snapshot)
    pub fn bindings_for(&self, table_id: i64, date: NaiveDate) -> StorageResult<Vec<Binding>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_BOOKINGS)?;
        collect_bindings(&table, table_id, date)
    }

    /// Bindings of one table on one date, seen from inside a write transaction
    pub fn bindings_for_txn(
        &self,
        txn: &WriteTransaction,
        table_id: i64,
        date: NaiveDate,
    ) -> StorageResult<Vec<Binding>> {
        let table = txn.open_table(TABLE_BOOKINGS)?;
        collect_bindings(&table, table_id, date)
    }

    pub fn insert_binding(&self, txn: &WriteTransaction, binding: &Binding) -> StorageResult<()> {
        let mut table = txn.open_table(TABLE_BOOKINGS)?;
        let date = date_key(binding.date);
        table.insert(
            (binding.table_id, date.as_str(), binding.start_minute),
            binding.reservation_id.as_str(),
        )?;
        Ok(())
    }

    /// Remove a binding, returns whether one existed
    pub fn remove_binding(
        &self,
        txn: &WriteTransaction,
        table_id: i64,
        date: NaiveDate,
        start_minute: u32,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(TABLE_BOOKINGS)?;
        let date = date_key(date);
        let removed = table.remove((table_id, date.as_str(), start_minute))?;
        Ok(removed.is_some())
    }

    /// Total binding rows (tests and diagnostics)
    pub fn count_bindings(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_BOOKINGS)?;
        let mut count = 0;
        for result in table.iter()? {
            result?;
            count += 1;
        }
        Ok(count)
    }

    // ========== Reservations ==========

    pub fn get_reservation(&self, id: &str) -> StorageResult<Option<Reservation>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESERVATIONS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_reservation_txn(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StorageResult<Option<Reservation>> {
        let table = txn.open_table(RESERVATIONS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_reservation(
        &self,
        txn: &WriteTransaction,
        reservation: &Reservation,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(RESERVATIONS)?;
        let value = serde_json::to_vec(reservation)?;
        table.insert(reservation.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Claim a reservation number; `false` if it is already taken
    pub fn claim_reservation_number(
        &self,
        txn: &WriteTransaction,
        number: &str,
        reservation_id: &str,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(RESERVATION_NUMBERS)?;
        if table.get(number)?.is_some() {
            return Ok(false);
        }
        table.insert(number, reservation_id)?;
        Ok(true)
    }

    /// All reservations (unordered)
    pub fn list_reservations(&self) -> StorageResult<Vec<Reservation>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RESERVATIONS)?;

        let mut reservations = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            reservations.push(serde_json::from_slice(value.value())?);
        }
        Ok(reservations)
    }

    // ========== Carts ==========

    pub fn get_cart(&self, session_id: &str) -> StorageResult<Option<Cart>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARTS)?;
        match table.get(session_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_cart_txn(
        &self,
        txn: &WriteTransaction,
        session_id: &str,
    ) -> StorageResult<Option<Cart>> {
        let table = txn.open_table(CARTS)?;
        match table.get(session_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_cart(&self, txn: &WriteTransaction, cart: &Cart) -> StorageResult<()> {
        let mut table = txn.open_table(CARTS)?;
        let value = serde_json::to_vec(cart)?;
        table.insert(cart.session_id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn delete_cart(&self, txn: &WriteTransaction, session_id: &str) -> StorageResult<()> {
        let mut table = txn.open_table(CARTS)?;
        table.remove(session_id)?;
        Ok(())
    }

    /// Load (or start) a session cart, apply `f` and save the result atomically
    ///
    /// Nothing is written when `f` fails. A cart left empty is removed
    /// rather than stored.
    pub fn update_cart<R, E>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Cart) -> Result<R, E>,
    ) -> Result<(Cart, R), E>
    where
        E: From<StorageError>,
    {
        let txn = self.begin_write()?;
        let mut cart = self
            .get_cart_txn(&txn, session_id)?
            .unwrap_or_else(|| Cart::new(session_id));

        let result = f(&mut cart)?;

        if cart.is_empty() {
            self.delete_cart(&txn, session_id)?;
        } else {
            self.put_cart(&txn, &cart)?;
        }
        txn.commit().map_err(StorageError::from)?;
        Ok((cart, result))
    }

    // ========== Orders ==========

    pub fn get_order(&self, id: &str) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_order_txn(&self, txn: &WriteTransaction, id: &str) -> StorageResult<Option<Order>> {
        let table = txn.open_table(ORDERS)?;
        match table.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_order(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut table = txn.open_table(ORDERS)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    /// Claim an order number; `false` if it is already taken
    pub fn claim_order_number(
        &self,
        txn: &WriteTransaction,
        number: &str,
        order_id: &str,
    ) -> StorageResult<bool> {
        let mut table = txn.open_table(ORDER_NUMBERS)?;
        if table.get(number)?.is_some() {
            return Ok(false);
        }
        table.insert(number, order_id)?;
        Ok(true)
    }

    /// All orders (unordered)
    pub fn list_orders(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS)?;

        let mut orders = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            orders.push(serde_json::from_slice(value.value())?);
        }
        Ok(orders)
    }

    // ========== Checkout Idempotency ==========

    /// Order produced by a cart, if that cart was already checked out
    pub fn checkout_order_id_txn(
        &self,
        txn: &WriteTransaction,
        cart_id: &str,
    ) -> StorageResult<Option<String>> {
        let table = txn.open_table(CHECKOUTS)?;
        Ok(table.get(cart_id)?.map(|g| g.value().to_string()))
    }

    pub fn record_checkout(
        &self,
        txn: &WriteTransaction,
        cart_id: &str,
        order_id: &str,
    ) -> StorageResult<()> {
        let mut table = txn.open_table(CHECKOUTS)?;
        table.insert(cart_id, order_id)?;
        Ok(())
    }
}

fn collect_bindings(
    table: &impl ReadableTable<(i64, &'static str, u32), &'static str>,
    table_id: i64,
    date: NaiveDate,
) -> StorageResult<Vec<Binding>> {
    let day = date_key(date);
    let start = (table_id, day.as_str(), 0u32);
    let end = (table_id, day.as_str(), u32::MAX);

    let mut bindings = Vec::new();
    for result in table.range(start..=end)? {
        let (key, value) = result?;
        let (_, _, start_minute) = key.value();
        bindings.push(Binding {
            table_id,
            date,
            start_minute,
            reservation_id: value.value().to_string(),
        });
    }
    Ok(bindings)
}
