//! Admin dashboard route handlers (read-only).

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use brana_core::{OrderStatus, UserRole};

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Default and maximum page size for dashboard listings.
const DEFAULT_LIMIT: u32 = 50;
const MAX_LIMIT: u32 = 500;

/// Query parameters shared by the listing routes.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
}

impl ListQuery {
    fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// `GET /api/admin/summary`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn summary(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<Value>> {
    let stores = state.stores();
    let orders = stores.orders.summary().await?;
    let (messages, subscribers) = stores.messages.counts().await?;
    let customers = stores.users.count_by_role(UserRole::Customer).await?;
    let products = stores.products.count_active().await?;

    Ok(Json(json!({
        "orders": orders,
        "messages": messages,
        "subscribers": subscribers,
        "customers": customers,
        "products": products,
    })))
}

/// `GET /api/admin/orders?status=`
#[instrument(skip(state, admin, query), fields(admin_id = %admin.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(AppError::BadRequest)?;

    let orders = state
        .stores()
        .orders
        .list_recent(status, query.limit())
        .await?;

    Ok(Json(json!({ "orders": orders })))
}

/// `GET /api/admin/messages`
#[instrument(skip(state, admin, query), fields(admin_id = %admin.id))]
pub async fn messages(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let messages = state.stores().messages.list_contacts(query.limit()).await?;
    Ok(Json(json!({ "messages": messages })))
}

/// `GET /api/admin/subscribers`
#[instrument(skip(state, admin, query), fields(admin_id = %admin.id))]
pub async fn subscribers(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let subscribers = state
        .stores()
        .messages
        .list_subscribers(query.limit())
        .await?;
    Ok(Json(json!({ "subscribers": subscribers })))
}
