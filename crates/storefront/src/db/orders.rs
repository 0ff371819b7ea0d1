//! Order persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;

use brana_core::{
    CartLineItem, Order, OrderId, OrderStatus, OrderTotals, ShippingAddress, UserId,
};

use super::{PgStore, RepositoryError};
use crate::models::{NewOrder, OrderSummary};

/// Persistence for placed orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Store a new order with status `pending`.
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// A user's orders, newest first.
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// One of a user's orders. Orders belonging to someone else are `None`.
    async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Most recent orders across all users, optionally filtered by status.
    async fn list_recent(
        &self,
        status: Option<OrderStatus>,
        limit: u32,
    ) -> Result<Vec<Order>, RepositoryError>;

    /// Counts per status and revenue.
    async fn summary(&self) -> Result<OrderSummary, RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    account_id: i32,
    items: Json<Vec<CartLineItem>>,
    shipping_address: Json<ShippingAddress>,
    payment_method: String,
    currency: String,
    subtotal: Decimal,
    shipping: Decimal,
    tax: Decimal,
    total: Decimal,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.account_id),
            items: row.items.0,
            shipping_address: row.shipping_address.0,
            payment_method: row
                .payment_method
                .parse()
                .map_err(RepositoryError::DataCorruption)?,
            currency: row
                .currency
                .parse()
                .map_err(RepositoryError::DataCorruption)?,
            totals: OrderTotals {
                subtotal: row.subtotal,
                shipping: row.shipping,
                tax: row.tax,
                total: row.total,
            },
            status: row.status.parse().map_err(RepositoryError::DataCorruption)?,
            created_at: row.created_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, account_id, items, shipping_address, payment_method, currency, \
                             subtotal, shipping, tax, total, status, created_at";

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
    rows.into_iter().map(Order::try_from).collect()
}

#[async_trait]
impl OrderStore for PgStore {
    async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let sql = format!(
            "INSERT INTO storefront.customer_order
                (account_id, items, shipping_address, payment_method, currency,
                 subtotal, shipping, tax, total)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order.user_id)
            .bind(Json(&order.items))
            .bind(Json(&order.shipping_address))
            .bind(order.payment_method.as_str())
            .bind(order.currency.code())
            .bind(order.totals.subtotal)
            .bind(order.totals.shipping)
            .bind(order.totals.tax)
            .bind(order.totals.total)
            .fetch_one(self.pool())
            .await?;
        Order::try_from(row)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.customer_order
             WHERE account_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool())
            .await?;
        into_orders(rows)
    }

    async fn get_for_user(
        &self,
        user_id: UserId,
        id: OrderId,
    ) -> Result<Option<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.customer_order
             WHERE id = $1 AND account_id = $2"
        );
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?
            .map(Order::try_from)
            .transpose()
    }

    async fn list_recent(
        &self,
        status: Option<OrderStatus>,
        limit: u32,
    ) -> Result<Vec<Order>, RepositoryError> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM storefront.customer_order
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(status.map(OrderStatus::as_str))
            .bind(i64::from(limit))
            .fetch_all(self.pool())
            .await?;
        into_orders(rows)
    }

    async fn summary(&self) -> Result<OrderSummary, RepositoryError> {
        let rows: Vec<(String, i64, Decimal)> = sqlx::query_as(
            r"
            SELECT status, COUNT(*), COALESCE(SUM(total), 0)
            FROM storefront.customer_order
            GROUP BY status
            ",
        )
        .fetch_all(self.pool())
        .await?;

        let mut summary = OrderSummary::default();
        for (status, count, total) in rows {
            let status = status
                .parse::<OrderStatus>()
                .map_err(RepositoryError::DataCorruption)?;
            summary.record(status, u64::try_from(count).unwrap_or(0), total);
        }
        Ok(summary)
    }
}
