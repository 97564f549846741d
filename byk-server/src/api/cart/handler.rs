//! Cart API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{CartItemInput, CartQuantityUpdate};

use crate::api::extract::SessionId;
use crate::cart::{Cart, CartView};
use crate::core::{BookingError, ServerState};
use crate::utils::{ApiResponse, AppResult, ok};

/// GET /api/cart - current cart, empty when the session has none
pub async fn get_cart(
    State(state): State<ServerState>,
    SessionId(session_id): SessionId,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let cart = state
        .storage
        .get_cart(&session_id)
        .map_err(BookingError::from)?
        .unwrap_or_else(|| Cart::new(&session_id));
    Ok(ok(cart.view()))
}

/// POST /api/cart/items - add one unit of a dish
pub async fn add_item(
    State(state): State<ServerState>,
    SessionId(session_id): SessionId,
    Json(payload): Json<CartItemInput>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let (cart, quantity) = state
        .storage
        .update_cart::<_, BookingError>(&session_id, |cart| {
            cart.add_item(&payload).map(|line| line.quantity)
        })?;
    tracing::debug!(
        session_id = %session_id,
        dish_id = %payload.dish_id,
        quantity,
        "Cart item added"
    );
    Ok(ok(cart.view()))
}

/// PUT /api/cart/items/{dish_id} - set a line's quantity, zero or less removes it
pub async fn set_quantity(
    State(state): State<ServerState>,
    SessionId(session_id): SessionId,
    Path(dish_id): Path<String>,
    Json(payload): Json<CartQuantityUpdate>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let (cart, _) = state
        .storage
        .update_cart::<_, BookingError>(&session_id, |cart| {
            cart.set_quantity(&dish_id, payload.quantity)
        })?;
    Ok(ok(cart.view()))
}

/// DELETE /api/cart/items/{dish_id}
pub async fn remove_item(
    State(state): State<ServerState>,
    SessionId(session_id): SessionId,
    Path(dish_id): Path<String>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let (cart, _) = state
        .storage
        .update_cart::<_, BookingError>(&session_id, |cart| {
            cart.remove_item(&dish_id);
            Ok(())
        })?;
    Ok(ok(cart.view()))
}

/// DELETE /api/cart
pub async fn clear(
    State(state): State<ServerState>,
    SessionId(session_id): SessionId,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let (cart, _) = state
        .storage
        .update_cart::<_, BookingError>(&session_id, |cart| {
            cart.clear();
            Ok(())
        })?;
    tracing::debug!(session_id = %session_id, "Cart cleared");
    Ok(ok(cart.view()))
}
