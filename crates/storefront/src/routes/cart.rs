//! Cart API route handlers.
//!
//! Every route requires a session user; the owner is always the session's
//! user id. A `userId` sent by the client is only checked against it.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::{Stream, StreamExt};
use tracing::instrument;

use brana_core::{Cart, CartLineItem, ProductId};

use crate::error::{ApiJson, AppError, Result};
use crate::i18n::Message;
use crate::middleware::{Lang, RequireAuth};
use crate::models::CurrentUser;
use crate::state::AppState;

/// SSE event name for cart changes.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

/// Cart as returned by mutating routes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<CartLineItem>,
    pub item_count: u32,
    pub subtotal: Decimal,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            item_count: cart.item_count(),
            subtotal: cart.subtotal(),
            items: cart.into_items(),
        }
    }
}

/// Query string for `GET /api/cart/get`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuery {
    pub user_id: Option<String>,
}

/// Body for `POST /api/cart/add` and `POST /api/cart/update`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuantityRequest {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
}

/// Body for `POST /api/cart/remove`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    pub product_id: Option<String>,
}

/// Body for `POST /api/cart/merge`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub items: Vec<CartLineItem>,
}

/// Body for `POST /api/cart/sync`.
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub items: Vec<CartLineItem>,
}

fn require_product_id(raw: Option<&str>) -> Result<ProductId> {
    raw.and_then(ProductId::parse)
        .ok_or_else(|| AppError::BadRequest("productId is required".to_string()))
}

/// Reject a client-supplied owner that is not the session user.
///
/// Accepts the id as a JSON number or string.
fn ensure_owner(user: &CurrentUser, claimed: Option<&Value>) -> Result<()> {
    let matches = match claimed {
        None | Some(Value::Null) => true,
        Some(Value::Number(n)) => n.as_i64() == Some(i64::from(user.id.as_i32())),
        Some(Value::String(s)) => s.trim() == user.id.to_string(),
        Some(_) => false,
    };
    if matches {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Cannot access another user's cart".to_string(),
        ))
    }
}

/// `GET /api/cart/get`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<CartQuery>,
) -> Result<Json<Value>> {
    let claimed = query.user_id.map(Value::String);
    ensure_owner(&user, claimed.as_ref())?;

    let cart = state.carts().get(user.id).await?;
    Ok(Json(json!({ "items": cart.items() })))
}

/// `POST /api/cart/add`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Lang(locale): Lang,
    ApiJson(body): ApiJson<QuantityRequest>,
) -> Result<Json<Value>> {
    let product_id = require_product_id(body.product_id.as_deref())?;
    let quantity = body
        .quantity
        .ok_or_else(|| AppError::BadRequest("quantity is required".to_string()))?;

    let cart = state
        .carts()
        .add(user.id, &product_id, quantity, locale)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": Message::ItemAdded.text(locale),
        "cart": CartView::from(cart),
    })))
}

/// `POST /api/cart/update`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Lang(locale): Lang,
    ApiJson(body): ApiJson<QuantityRequest>,
) -> Result<Json<Value>> {
    let product_id = require_product_id(body.product_id.as_deref())?;
    let quantity = body
        .quantity
        .ok_or_else(|| AppError::BadRequest("quantity is required".to_string()))?;

    let cart = state
        .carts()
        .update(user.id, &product_id, quantity)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": Message::CartUpdated.text(locale),
        "cart": CartView::from(cart),
    })))
}

/// `POST /api/cart/remove`
#[instrument(skip(state, user, body), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Lang(locale): Lang,
    ApiJson(body): ApiJson<RemoveRequest>,
) -> Result<Json<Value>> {
    let product_id = require_product_id(body.product_id.as_deref())?;
    let cart = state.carts().remove(user.id, &product_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": Message::ItemRemoved.text(locale),
        "items": cart.items(),
    })))
}

/// `POST /api/cart/clear`
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Lang(locale): Lang,
) -> Result<Json<Value>> {
    state.carts().clear(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": Message::CartCleared.text(locale),
    })))
}

/// `POST /api/cart/merge`
///
/// Folds a guest cart into the session user's cart. Quantities for products
/// already in the cart are added together.
#[instrument(skip(state, user, body), fields(user_id = %user.id, incoming = body.items.len()))]
pub async fn merge(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Lang(locale): Lang,
    ApiJson(body): ApiJson<MergeRequest>,
) -> Result<Json<Value>> {
    ensure_owner(&user, body.user_id.as_ref())?;

    state.carts().merge(user.id, body.items).await?;

    Ok(Json(json!({
        "message": Message::CartMerged.text(locale),
    })))
}

/// `POST /api/cart/sync`
///
/// Overwrites the session user's cart with the given items.
#[instrument(skip(state, user, body), fields(user_id = %user.id, incoming = body.items.len()))]
pub async fn sync(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Lang(locale): Lang,
    ApiJson(body): ApiJson<SyncRequest>,
) -> Result<Json<Value>> {
    state.carts().sync(user.id, body.items).await?;

    Ok(Json(json!({
        "success": true,
        "message": Message::CartSynced.text(locale),
    })))
}

/// `GET /api/cart/events`
///
/// Server-Sent Events stream of the session user's cart changes. Only events
/// published after the stream opened are delivered.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn events(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let owner = user.id;
    let receiver = state.cart_events().subscribe().into_receiver();

    let stream = BroadcastStream::new(receiver).filter_map(move |event| match event {
        Ok(event) if event.owner == owner => Event::default()
            .event(CART_UPDATED_EVENT)
            .json_data(&event)
            .ok()
            .map(Ok),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(missed)) => {
            tracing::debug!(owner = %owner, missed, "Cart event stream lagged");
            // Tell the client to refetch; it cannot know what it missed.
            Some(Ok(Event::default()
                .event(CART_UPDATED_EVENT)
                .data(json!({ "owner": owner, "kind": "lagged" }).to_string())))
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
