//! Restaurant API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::models::DiningTable;

use crate::core::ServerState;
use crate::utils::time::{parse_date, parse_time};
use crate::utils::{ApiResponse, AppError, AppResult, ok};

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
    pub time: String,
    pub party_size: i32,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityResponse {
    pub restaurant_id: String,
    pub date: String,
    pub time: String,
    pub party_size: i32,
    pub slot_duration_minutes: u32,
    pub tables: Vec<DiningTable>,
}

/// GET /api/restaurants/{restaurant_id}/tables
pub async fn list_tables(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<DiningTable>>>> {
    let tables = state
        .storage
        .list_tables(&restaurant_id)
        .map_err(|e| AppError::database(e.to_string()))?;
    Ok(ok(tables))
}

/// GET /api/restaurants/{restaurant_id}/availability?date=&time=&party_size=
///
/// Candidate tables, smallest first. An empty list is a normal answer.
pub async fn availability(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<ApiResponse<AvailabilityResponse>>> {
    let date = parse_date(&query.date)?;
    let time = parse_time(&query.time)?;

    let engine = state.reservations.engine();
    let tables = engine.find_candidates(&restaurant_id, query.party_size, date, time)?;

    Ok(ok(AvailabilityResponse {
        restaurant_id,
        date: date.to_string(),
        time: time.format("%H:%M").to_string(),
        party_size: query.party_size,
        slot_duration_minutes: engine.slot_minutes(),
        tables,
    }))
}
