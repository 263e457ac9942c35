//! Turning the cart into a sale.
//!
//! `preview` computes the totals and the debt-limit status without changing
//! anything; `build_sale` validates the form and produces the sale the store
//! dispatches as `AddSale`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::cart;
use crate::debts::{check_debt_limit, DebtLimitCheck};
use crate::error::{PosError, PosResult};
use crate::models::{PaymentMethod, Sale, SaleItem};
use crate::reducer::AppState;
use crate::settings::Settings;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    #[serde(default, alias = "customer_name")]
    pub customer_name: Option<String>,
    #[serde(default, alias = "customer_phone")]
    pub customer_phone: Option<String>,
    #[serde(default, alias = "payment_method")]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub discount: f64,
    #[serde(default, alias = "discount_reason")]
    pub discount_reason: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, alias = "debtor_name")]
    pub debtor_name: Option<String>,
    #[serde(default, alias = "override_debt_limit")]
    pub override_debt_limit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTotals {
    pub subtotal: f64,
    pub discount: f64,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub final_total: f64,
    pub item_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPreview {
    pub totals: CheckoutTotals,
    pub debt_limit: DebtLimitCheck,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum CheckoutOutcome {
    Completed { sale: Sale },
    /// Nothing was recorded; resubmit with `overrideDebtLimit` to proceed.
    LimitExceeded { check: DebtLimitCheck },
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn totals(state: &AppState, settings: &Settings, discount: f64) -> CheckoutTotals {
    let subtotal = cart::cart_total(&state.cart);
    let tax_rate = settings.effective_tax_rate();
    let final_total = cart::final_total(subtotal, tax_rate, discount);
    CheckoutTotals {
        subtotal,
        discount,
        tax_rate,
        tax_amount: final_total - (subtotal - discount),
        final_total,
        item_count: cart::item_count(&state.cart),
    }
}

fn payment_method(form: &CheckoutForm) -> PosResult<PaymentMethod> {
    match form.payment_method.as_deref() {
        None => Ok(PaymentMethod::Cash),
        Some(raw) => PaymentMethod::from_value(Some(raw))
            .ok_or_else(|| PosError::Invalid(format!("unknown payment method: {raw}"))),
    }
}

pub fn preview(state: &AppState, settings: &Settings, form: &CheckoutForm) -> PosResult<CheckoutPreview> {
    let method = payment_method(form)?;
    let totals = totals(state, settings, form.discount);
    let debt_limit = match (method, trimmed(&form.debtor_name)) {
        (PaymentMethod::Debt, Some(name)) => {
            check_debt_limit(&state.sales, settings, &name, totals.final_total)
        }
        _ => DebtLimitCheck::Unlimited,
    };
    Ok(CheckoutPreview { totals, debt_limit })
}

/// Validate the form against the cart and build the sale.
pub fn build_sale(
    state: &AppState,
    settings: &Settings,
    form: &CheckoutForm,
    now: DateTime<Utc>,
) -> PosResult<CheckoutOutcome> {
    if state.cart.is_empty() {
        return Err(PosError::EmptyCart);
    }
    if !form.discount.is_finite() || form.discount < 0.0 {
        return Err(PosError::Invalid(format!("invalid discount: {}", form.discount)));
    }
    let discount_reason = trimmed(&form.discount_reason);
    if form.discount > 0.0 && discount_reason.is_none() {
        return Err(PosError::MissingDiscountReason);
    }
    let method = payment_method(form)?;
    let debtor_name = trimmed(&form.debtor_name);
    let is_debt = method == PaymentMethod::Debt;
    if is_debt && debtor_name.is_none() {
        return Err(PosError::MissingDebtor);
    }

    // Stock may have changed since the lines were added.
    let mut items = Vec::with_capacity(state.cart.len());
    for line in &state.cart {
        let product = state
            .product(&line.product.id)
            .ok_or_else(|| PosError::ProductNotFound(line.product.id.clone()))?;
        if !product.has_enough_stock(line.quantity) {
            return Err(PosError::InsufficientStock {
                name: product.name.clone(),
                requested: line.quantity,
                available: product.stock,
            });
        }
        items.push(SaleItem {
            product: product.clone(),
            quantity: line.quantity,
            price: product.price,
        });
    }

    let totals = totals(state, settings, form.discount);
    if totals.final_total < 0.0 {
        return Err(PosError::Invalid("discount exceeds the sale total".into()));
    }

    if let Some(name) = debtor_name.as_deref().filter(|_| is_debt) {
        let check = check_debt_limit(&state.sales, settings, name, totals.final_total);
        if check.is_exceeded() {
            if !form.override_debt_limit {
                return Ok(CheckoutOutcome::LimitExceeded { check });
            }
            warn!(debtor = %name, final_total = totals.final_total, "Debt limit overridden at checkout");
        }
    }

    Ok(CheckoutOutcome::Completed {
        sale: Sale {
            id: Uuid::new_v4().to_string(),
            items,
            total: totals.subtotal,
            tax: totals.tax_rate,
            discount: form.discount,
            final_total: totals.final_total,
            payment_method: method,
            is_debt,
            is_frozen: false,
            debtor_name: if is_debt { debtor_name } else { None },
            customer_name: trimmed(&form.customer_name),
            customer_phone: trimmed(&form.customer_phone)
                .map(|p| crate::data_helpers::normalize_phone(&p)),
            discount_reason,
            notes: trimmed(&form.notes),
            created_at: now,
            updated_at: None,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CartItem;
    use crate::reducer::fixtures::*;
    use crate::reducer::{reduce, Action};
    use crate::settings::{DebtorInput, SettingsPatch};

    fn state_with_cart(price: f64, qty: i64) -> AppState {
        let p = product("p1", price, 10);
        AppState {
            products: vec![p.clone()],
            cart: vec![CartItem {
                product: p,
                quantity: qty,
            }],
            sales: Vec::new(),
        }
    }

    fn completed(outcome: CheckoutOutcome) -> Sale {
        match outcome {
            CheckoutOutcome::Completed { sale } => sale,
            other => panic!("expected completed sale, got {other:?}"),
        }
    }

    #[test]
    fn cash_sale_decrements_stock_and_clears_cart() {
        let state = state_with_cart(10.0, 3);
        let sale = completed(
            build_sale(&state, &Settings::default(), &CheckoutForm::default(), ts(10, 9)).unwrap(),
        );
        assert_eq!(sale.final_total, 30.0);
        assert_eq!(sale.payment_method, PaymentMethod::Cash);
        assert!(!sale.is_debt);

        let state = reduce(state, Action::AddSale(sale));
        assert!(state.cart.is_empty());
        assert_eq!(state.product("p1").unwrap().stock, 7);
    }

    #[test]
    fn tax_applies_after_discount_only_when_enabled() {
        let state = state_with_cart(50.0, 2);
        let mut settings = Settings::default();
        let form = CheckoutForm {
            discount: 20.0,
            discount_reason: Some("loyal customer".into()),
            ..Default::default()
        };
        assert_eq!(totals(&state, &settings, form.discount).final_total, 80.0);

        settings
            .apply(SettingsPatch {
                should_apply_tax: Some(true),
                tax_rate: Some(15.0),
                ..Default::default()
            })
            .unwrap();
        let sale = completed(build_sale(&state, &settings, &form, ts(10, 9)).unwrap());
        assert_eq!(sale.total, 100.0);
        assert_eq!(sale.tax, 15.0);
        assert_eq!(sale.final_total, 92.0);
    }

    #[test]
    fn validation_errors() {
        let settings = Settings::default();
        assert_eq!(
            build_sale(&AppState::default(), &settings, &CheckoutForm::default(), ts(10, 9)),
            Err(PosError::EmptyCart)
        );
        let state = state_with_cart(10.0, 1);
        let discounted = CheckoutForm {
            discount: 1.0,
            ..Default::default()
        };
        assert_eq!(
            build_sale(&state, &settings, &discounted, ts(10, 9)),
            Err(PosError::MissingDiscountReason)
        );
        let debt = CheckoutForm {
            payment_method: Some("debt".into()),
            debtor_name: Some("  ".into()),
            ..Default::default()
        };
        assert_eq!(
            build_sale(&state, &settings, &debt, ts(10, 9)),
            Err(PosError::MissingDebtor)
        );
    }

    #[test]
    fn stale_cart_rejected_when_stock_dropped() {
        let mut state = state_with_cart(10.0, 4);
        state.products[0].stock = 2;
        assert!(matches!(
            build_sale(&state, &Settings::default(), &CheckoutForm::default(), ts(10, 9)),
            Err(PosError::InsufficientStock { requested: 4, available: 2, .. })
        ));
    }

    #[test]
    fn debt_limit_requires_override() {
        let mut state = state_with_cart(25.0, 1);
        state.sales = vec![debt_sale("a", "Ali", 50.0), debt_sale("b", "Ali", 30.0)];
        let mut settings = Settings::default();
        settings
            .add_debtor(DebtorInput {
                name: "Ali".into(),
                limit: Some(100.0),
                ..Default::default()
            })
            .unwrap();
        let mut form = CheckoutForm {
            payment_method: Some("debt".into()),
            debtor_name: Some("Ali".into()),
            ..Default::default()
        };

        let preview = preview(&state, &settings, &form).unwrap();
        assert!(preview.debt_limit.is_exceeded());

        let outcome = build_sale(&state, &settings, &form, ts(10, 9)).unwrap();
        assert!(matches!(outcome, CheckoutOutcome::LimitExceeded { .. }));

        form.override_debt_limit = true;
        let sale = completed(build_sale(&state, &settings, &form, ts(10, 9)).unwrap());
        assert!(sale.is_debt);
        assert_eq!(sale.debtor_name.as_deref(), Some("Ali"));
    }

    #[test]
    fn form_accepts_snake_case_aliases() {
        let form: CheckoutForm = serde_json::from_value(serde_json::json!({
            "payment_method": "card",
            "customer_name": "Sara",
            "overrideDebtLimit": true
        }))
        .unwrap();
        assert_eq!(form.payment_method.as_deref(), Some("card"));
        assert_eq!(form.customer_name.as_deref(), Some("Sara"));
        assert!(form.override_debt_limit);
    }
}
