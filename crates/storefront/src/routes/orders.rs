//! Checkout and order history route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::instrument;

use brana_core::OrderId;

use crate::error::{ApiJson, AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::checkout::{CheckoutRequest, place_order};
use crate::state::AppState;

/// `POST /api/checkout`
///
/// Turns the session user's cart into a pending order and empties the cart.
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let carts = state.carts();
    let order = place_order(
        &carts,
        state.stores().orders.as_ref(),
        &state.config().pricing,
        user.id,
        request,
    )
    .await?;

    let order_id = order.id.to_string();
    add_breadcrumb("checkout", "Order placed", Some(&[("order_id", &order_id)]));

    Ok((StatusCode::CREATED, Json(json!({ "order": order }))))
}

/// `GET /api/orders`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let orders = state.stores().orders.list_for_user(user.id).await?;
    Ok(Json(json!({ "orders": orders })))
}

/// `GET /api/orders/{id}`
///
/// Another user's order is reported as not found.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let order = state
        .stores()
        .orders
        .get_for_user(user.id, OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order not found: {id}")))?;

    Ok(Json(json!({ "order": order })))
}
