//! Dining Table Model

use serde::{Deserialize, Serialize};

/// Dining table entity, seeded from the catalog and never mutated by the core
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: i64,
    pub restaurant_id: String,
    /// Unique within the restaurant
    pub number: i32,
    pub capacity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl DiningTable {
    /// Whether the table can seat the given party
    pub fn fits(&self, party_size: i32) -> bool {
        self.capacity >= party_size
    }
}
