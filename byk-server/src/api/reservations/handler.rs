//! Reservation API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{Reservation, ReservationCreate, ReservationStats, ReservationStatus};
use shared::query::{Page, PaginatedResponse};

use crate::api::extract::CustomerId;
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<ReservationStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub restaurant_id: Option<String>,
    pub status: Option<ReservationStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmRequest {
    pub table_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// POST /api/reservations - create a pending reservation
pub async fn create(
    State(state): State<ServerState>,
    CustomerId(customer_id): CustomerId,
    Json(payload): Json<ReservationCreate>,
) -> AppResult<Json<ApiResponse<Reservation>>> {
    let reservation = state.reservations.create(&customer_id, payload)?;
    Ok(ok_with_message(reservation, "Reservation created"))
}

/// GET /api/reservations/my - the caller's reservations, newest first
pub async fn list_mine(
    State(state): State<ServerState>,
    CustomerId(customer_id): CustomerId,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Reservation>>>> {
    let page = Page::new(query.page, query.limit);
    let result = state
        .reservations
        .list_for_customer(&customer_id, query.status, page)?;
    Ok(ok(result))
}

/// GET /api/reservations/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    CustomerId(customer_id): CustomerId,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Reservation>>> {
    let reservation = state.reservations.get_for_customer(&customer_id, &id)?;
    Ok(ok(reservation))
}

/// POST /api/reservations/{id}/confirm - assign a table
pub async fn confirm(
    State(state): State<ServerState>,
    CustomerId(customer_id): CustomerId,
    Path(id): Path<String>,
    Json(payload): Json<ConfirmRequest>,
) -> AppResult<Json<ApiResponse<Reservation>>> {
    state.reservations.get_for_customer(&customer_id, &id)?;
    let reservation = state.reservations.confirm(&id, payload.table_id)?;
    Ok(ok_with_message(reservation, "Reservation confirmed"))
}

/// POST /api/reservations/{id}/cancel - body is optional
pub async fn cancel(
    State(state): State<ServerState>,
    CustomerId(customer_id): CustomerId,
    Path(id): Path<String>,
    payload: Option<Json<CancelRequest>>,
) -> AppResult<Json<ApiResponse<Reservation>>> {
    let Json(request) = payload.unwrap_or_default();
    state.reservations.get_for_customer(&customer_id, &id)?;
    let reservation = state.reservations.cancel(&id, request.reason)?;
    Ok(ok_with_message(reservation, "Reservation cancelled"))
}

/// GET /api/admin/reservations
pub async fn list_all(
    State(state): State<ServerState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Reservation>>>> {
    let page = Page::new(query.page, query.limit);
    let result = state
        .reservations
        .list(query.restaurant_id.as_deref(), query.status, page)?;
    Ok(ok(result))
}

/// GET /api/admin/reservations/stats
pub async fn stats(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<ReservationStats>>> {
    Ok(ok(state.reservations.status_summary()?))
}
