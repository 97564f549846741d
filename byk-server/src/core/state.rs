use anyhow::Context;
use shared::models::DiningTable;
use std::path::Path;
use std::sync::Arc;

use crate::core::Config;
use crate::orders::OrdersManager;
use crate::reservations::{BookingPolicy, ReservationsManager};
use crate::storage::BookingStorage;
use crate::utils::time::{Clock, SystemClock};

/// Server state - shared handles to storage and the lifecycle managers
///
/// Cloning is cheap: every field is reference counted.
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | configuration (immutable) |
/// | storage | redb-backed booking storage |
/// | reservations | reservation lifecycle + availability engine |
/// | orders | checkout and order lifecycle |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub storage: BookingStorage,
    pub reservations: Arc<ReservationsManager>,
    pub orders: Arc<OrdersManager>,
}

impl ServerState {
    /// Build the state over an already opened storage
    pub fn with_storage(config: Config, storage: BookingStorage, clock: Arc<dyn Clock>) -> Self {
        let policy = BookingPolicy::from_config(&config);
        let reservations = Arc::new(ReservationsManager::new(
            storage.clone(),
            policy,
            clock.clone(),
        ));
        let orders = Arc::new(OrdersManager::new(storage.clone(), clock, config.timezone));
        Self {
            config,
            storage,
            reservations,
            orders,
        }
    }

    /// Initialize the server state
    ///
    /// In order:
    /// 1. work directory (created if missing)
    /// 2. database (`work_dir/booking.redb`)
    /// 3. table seed from `TABLES_SEED_FILE`, when set
    /// 4. lifecycle managers on the system clock
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)
            .with_context(|| format!("failed to create work dir {}", config.work_dir))?;

        let db_path = config.database_path();
        let storage = BookingStorage::open(&db_path)
            .with_context(|| format!("failed to open database {}", db_path.display()))?;
        tracing::info!(path = %db_path.display(), "Database opened");

        if let Some(seed) = &config.tables_seed_file {
            let count = seed_tables_from_file(&storage, Path::new(seed))?;
            tracing::info!(file = %seed, count, "Dining tables seeded");
        }

        Ok(Self::with_storage(
            config.clone(),
            storage,
            Arc::new(SystemClock),
        ))
    }
}

/// Load a JSON array of [`DiningTable`] and upsert it
fn seed_tables_from_file(storage: &BookingStorage, path: &Path) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read table seed {}", path.display()))?;
    let tables: Vec<DiningTable> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid table seed {}", path.display()))?;
    if let Some(bad) = tables.iter().find(|t| t.capacity < 1) {
        anyhow::bail!("table {} has non-positive capacity {}", bad.id, bad.capacity);
    }
    Ok(storage.seed_tables(&tables)?)
}
