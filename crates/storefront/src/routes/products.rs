//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use brana_core::{Locale, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::Lang;
use crate::models::Product;
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
}

/// A product rendered in one language.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView<'a> {
    pub id: &'a ProductId,
    pub name: &'a str,
    pub description: &'a str,
    pub price: Decimal,
    pub image: Option<&'a str>,
    pub category: &'a str,
    pub in_stock: bool,
    pub locale: Locale,
}

impl<'a> ProductView<'a> {
    fn new(product: &'a Product, locale: Locale) -> Self {
        Self {
            id: &product.id,
            name: product.name.get(locale),
            description: product.description.get(locale),
            price: product.price,
            image: product.image.as_deref(),
            category: &product.category,
            in_stock: product.stock > 0,
            locale,
        }
    }
}

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Lang(locale): Lang,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let products = state.catalog().list(category).await?;
    let views: Vec<_> = products
        .iter()
        .map(|p| ProductView::new(p, locale))
        .collect();

    Ok(Json(json!({ "products": views })))
}

/// `GET /api/products/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Lang(locale): Lang,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let not_found = || AppError::NotFound(format!("Product not found: {id}"));

    let product_id = ProductId::parse(&id).ok_or_else(not_found)?;
    let product = state
        .catalog()
        .product(&product_id)
        .await?
        .filter(|p| p.active)
        .ok_or_else(not_found)?;

    Ok(Json(
        json!({ "product": ProductView::new(&product, locale) }),
    ))
}
