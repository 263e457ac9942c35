use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{parse_payload, to_json};
use crate::debts;
use crate::error::PosError;
use crate::models::PaymentMethod;
use crate::reducer::Action;
use crate::store::{AppStore, Section};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct DebtsListPayload {
    #[serde(default, alias = "q", alias = "query")]
    search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebtPayPayload {
    #[serde(alias = "sale_id", alias = "id")]
    sale_id: String,
    #[serde(default, alias = "paymentMethod", alias = "payment_method")]
    method: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebtFreezePayload {
    #[serde(alias = "sale_id", alias = "id")]
    sale_id: String,
    #[serde(default = "default_frozen", alias = "is_frozen", alias = "isFrozen")]
    frozen: bool,
}

fn default_frozen() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebtBalancePayload {
    #[serde(alias = "debtor_name", alias = "name")]
    debtor_name: String,
    #[serde(default)]
    candidate: Option<f64>,
}

pub(crate) fn debts_list(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: DebtsListPayload = parse_payload(arg0, "search")?;
    store.read(|data| {
        to_json(&debts::list_debtors(
            &data.state.sales,
            &data.settings,
            payload.search.as_deref(),
        ))
    })?
}

pub(crate) fn debts_pay(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: DebtPayPayload = parse_payload(arg0, "saleId")?;
    let method = match payload.method.as_deref() {
        None => PaymentMethod::Cash,
        Some(raw) => PaymentMethod::from_value(Some(raw))
            .ok_or_else(|| format!("Unknown payment method: {raw}"))?,
    };
    let sale = store.transact(&[Section::Sales], |data| {
        let sale = data
            .state
            .sale(&payload.sale_id)
            .ok_or_else(|| PosError::SaleNotFound(payload.sale_id.clone()))?;
        let paid = debts::pay_debt(sale, method, Utc::now())?;
        data.dispatch(Action::UpdateSale(paid.clone()));
        Ok(paid)
    })?;
    info!(
        sale_id = %sale.id,
        debtor = sale.debtor_name.as_deref().unwrap_or(""),
        amount = sale.final_total,
        method = method.as_str(),
        "Debt paid"
    );
    to_json(&sale)
}

pub(crate) fn debts_freeze(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: DebtFreezePayload = parse_payload(arg0, "saleId")?;
    let sale = store.transact(&[Section::Sales], |data| {
        let sale = data
            .state
            .sale(&payload.sale_id)
            .ok_or_else(|| PosError::SaleNotFound(payload.sale_id.clone()))?;
        let updated = debts::set_frozen(sale, payload.frozen, Utc::now())?;
        data.dispatch(Action::UpdateSale(updated.clone()));
        Ok(updated)
    })?;
    info!(sale_id = %sale.id, frozen = sale.is_frozen, "Debt freeze toggled");
    to_json(&sale)
}

/// Outstanding balance for one debtor, plus the limit check for an optional
/// candidate amount.
pub(crate) fn debts_balance(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: DebtBalancePayload = parse_payload(arg0, "debtorName")?;
    store.read(|data| {
        let balance = debts::debtor_balance(&data.state.sales, &payload.debtor_name);
        let check = debts::check_debt_limit(
            &data.state.sales,
            &data.settings,
            &payload.debtor_name,
            payload.candidate.unwrap_or(0.0),
        );
        json!({
            "debtorName": payload.debtor_name,
            "balance": balance,
            "limitCheck": check,
        })
    })
}
