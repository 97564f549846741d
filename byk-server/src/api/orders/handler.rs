//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{CheckoutRequest, Order, OrderStatus};
use shared::query::{Page, PaginatedResponse};

use crate::api::extract::{CustomerId, SessionId};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult, ok, ok_with_message};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub restaurant_id: Option<String>,
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AdvanceRequest {
    pub status: OrderStatus,
}

/// POST /api/orders/checkout
pub async fn checkout(
    State(state): State<ServerState>,
    CustomerId(customer_id): CustomerId,
    SessionId(session_id): SessionId,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let outcome = state.orders.checkout(&session_id, &customer_id, payload)?;
    let message = if outcome.replayed {
        "Order already placed for this cart"
    } else {
        "Order placed"
    };
    Ok(ok_with_message(outcome.order, message))
}

/// GET /api/orders/my
pub async fn list_mine(
    State(state): State<ServerState>,
    CustomerId(customer_id): CustomerId,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Order>>>> {
    let page = Page::new(query.page, query.limit);
    Ok(ok(state.orders.list_for_customer(&customer_id, page)?))
}

/// GET /api/orders/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    CustomerId(customer_id): CustomerId,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(ok(state.orders.get_for_customer(&customer_id, &id)?))
}

/// POST /api/orders/{id}/advance - restaurant side moves the order forward
pub async fn advance(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<AdvanceRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(ok(state.orders.advance(&id, payload.status)?))
}

/// POST /api/orders/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.orders.cancel(&id)?;
    Ok(ok_with_message(order, "Order cancelled"))
}

/// GET /api/admin/orders
pub async fn list_all(
    State(state): State<ServerState>,
    Query(query): Query<AdminListQuery>,
) -> AppResult<Json<ApiResponse<PaginatedResponse<Order>>>> {
    let page = Page::new(query.page, query.limit);
    let result = state
        .orders
        .list(query.restaurant_id.as_deref(), query.status, page)?;
    Ok(ok(result))
}
