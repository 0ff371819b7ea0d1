//! Order persistence inputs and dashboard aggregates.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use brana_core::{
    CartLineItem, CurrencyCode, OrderStatus, OrderTotals, PaymentMethod, ShippingAddress, UserId,
};

/// An order ready to be stored. The store assigns id, status and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<CartLineItem>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub currency: CurrencyCode,
    pub totals: OrderTotals,
}

/// Order counts and revenue for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub total_orders: u64,
    pub by_status: BTreeMap<String, u64>,
    /// Sum of totals over orders that were not cancelled.
    pub revenue: Decimal,
}

impl OrderSummary {
    /// Fold one status bucket into the summary.
    pub fn record(&mut self, status: OrderStatus, count: u64, total: Decimal) {
        self.total_orders += count;
        *self.by_status.entry(status.as_str().to_owned()).or_default() += count;
        if status != OrderStatus::Cancelled {
            self.revenue += total;
        }
    }
}
