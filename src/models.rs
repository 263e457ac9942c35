//! Value records shared by every part of the POS.
//!
//! All records serialize with camelCase keys so the JSON stored in
//! `local_settings` and the JSON returned to the web client share one shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    pub stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn has_enough_stock(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

/// Editable product fields; id and timestamps are owned by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub cost: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product: Product,
    pub quantity: i64,
}

/// A sold line: product snapshot at sale time plus the unit price charged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub product: Product,
    pub quantity: i64,
    pub price: f64,
}

impl SaleItem {
    pub fn line_total(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Debt,
    Other,
}

impl PaymentMethod {
    pub fn from_value(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
            Some("cash") => Some(Self::Cash),
            Some("card") => Some(Self::Card),
            Some("debt") => Some(Self::Debt),
            Some("other") => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Debt => "debt",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub items: Vec<SaleItem>,
    /// Subtotal before discount and tax.
    pub total: f64,
    /// Tax percentage applied after the discount.
    pub tax: f64,
    pub discount: f64,
    pub final_total: f64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub is_debt: bool,
    #[serde(default)]
    pub is_frozen: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debtor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Sale {
    /// Counts toward a debtor balance and the due-debt bucket.
    pub fn is_outstanding_debt(&self) -> bool {
        self.is_debt && !self.is_frozen
    }

    pub fn debtor_is(&self, name: &str) -> bool {
        self.debtor_name.as_deref() == Some(name)
    }

    /// Last time the sale changed: `updatedAt` if set, else `createdAt`.
    pub fn last_touched(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    #[serde(default)]
    pub reason: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReport {
    pub id: String,
    pub date: DateTime<Utc>,
    pub sales_count: usize,
    pub total_sales: f64,
    pub total_cash_sales: f64,
    pub total_card_sales: f64,
    pub total_debt_sales: f64,
    pub cash_in_drawer: f64,
    /// Counted minus expected cash. Positive is a surplus.
    pub cash_shortage: f64,
    #[serde(default)]
    pub expenses: f64,
    #[serde(default)]
    pub paid_debts: Vec<Sale>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizedDebtor {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AuthorizedDebtor {
    /// Configured limit, or `None` when credit is unlimited (unset or zero).
    pub fn effective_limit(&self) -> Option<f64> {
        self.limit.filter(|l| *l > 0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_defaults_missing_flags_to_false() {
        let raw = serde_json::json!({
            "id": "s1",
            "items": [],
            "total": 10.0,
            "tax": 0.0,
            "discount": 0.0,
            "finalTotal": 10.0,
            "paymentMethod": "cash",
            "createdAt": "2026-01-02T10:00:00Z"
        });
        let sale: Sale = serde_json::from_value(raw).unwrap();
        assert!(!sale.is_debt);
        assert!(!sale.is_frozen);
        assert!(sale.updated_at.is_none());
        assert_eq!(sale.last_touched(), sale.created_at);
    }

    #[test]
    fn frozen_debt_is_not_outstanding() {
        let raw = serde_json::json!({
            "id": "s2",
            "items": [],
            "total": 20.0,
            "tax": 0.0,
            "discount": 0.0,
            "finalTotal": 20.0,
            "paymentMethod": "debt",
            "isDebt": true,
            "isFrozen": true,
            "debtorName": "Ali",
            "createdAt": "2026-01-02T10:00:00Z"
        });
        let sale: Sale = serde_json::from_value(raw).unwrap();
        assert!(!sale.is_outstanding_debt());
        assert!(sale.debtor_is("Ali"));
    }

    #[test]
    fn payment_method_parses_loosely() {
        assert_eq!(PaymentMethod::from_value(Some(" Card ")), Some(PaymentMethod::Card));
        assert_eq!(PaymentMethod::from_value(Some("bitcoin")), None);
        assert_eq!(PaymentMethod::from_value(None), None);
    }

    #[test]
    fn zero_limit_means_unlimited() {
        let debtor = AuthorizedDebtor {
            id: "d1".into(),
            name: "Ali".into(),
            phone: None,
            limit: Some(0.0),
            notes: None,
        };
        assert_eq!(debtor.effective_limit(), None);
    }
}
