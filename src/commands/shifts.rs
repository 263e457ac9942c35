use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{parse_payload, to_json};
use crate::models::Sale;
use crate::shifts::{self as shift_service, CashVariance, ShiftSummary};
use crate::store::{AppStore, Section, StoreData};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AmountPayload {
    #[serde(alias = "countedCash", alias = "counted_cash", alias = "value")]
    amount: f64,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct NotesPayload {
    #[serde(default)]
    notes: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpensePayload {
    amount: f64,
    #[serde(default, alias = "description")]
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpenseIdPayload {
    #[serde(alias = "expenseId", alias = "expense_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SaleIdPayload {
    #[serde(alias = "sale_id", alias = "id")]
    sale_id: String,
}

fn today_summary(data: &StoreData) -> ShiftSummary {
    shift_service::summarize(&shift_service::sales_on(
        &data.state.sales,
        shift_service::today(),
    ))
}

fn paid_debts_today(data: &StoreData) -> Vec<Sale> {
    shift_service::paid_debts_on(&data.state.sales, shift_service::today())
}

fn shift_view(data: &StoreData) -> Value {
    let summary = today_summary(data);
    let variance = CashVariance::compute(
        summary.total_cash_sales,
        data.draft.total_expenses(),
        data.draft.counted_cash,
    );
    json!({
        "summary": summary,
        "variance": variance,
        "varianceLabel": variance.label(),
        "isSurplus": variance.is_surplus(),
        "availableCash": variance.adjusted_expected,
        "draft": data.draft,
    })
}

pub(crate) fn shift_summary(store: &AppStore) -> Result<Value, String> {
    store.read(shift_view)
}

pub(crate) fn shift_set_counted_cash(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: AmountPayload = match arg0 {
        Some(Value::Number(n)) => AmountPayload {
            amount: n.as_f64().unwrap_or_default(),
        },
        other => parse_payload(other, "amount")?,
    };
    store.transact(&[Section::Draft], |data| {
        data.draft.set_counted_cash(payload.amount)?;
        Ok(shift_view(data))
    })
}

pub(crate) fn shift_set_notes(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: NotesPayload = parse_payload(arg0, "notes")?;
    store.transact(&[Section::Draft], |data| {
        data.draft.set_notes(&payload.notes);
        Ok(shift_view(data))
    })
}

pub(crate) fn shift_add_expense(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: ExpensePayload = parse_payload(arg0, "reason")?;
    let expense = store.transact(&[Section::Draft], |data| {
        let cash = today_summary(data).total_cash_sales;
        data.draft
            .add_expense(cash, payload.amount, &payload.reason, Utc::now())
    })?;
    info!(expense_id = %expense.id, amount = expense.amount, "Shift expense added");
    to_json(&expense)
}

pub(crate) fn shift_remove_expense(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: ExpenseIdPayload = parse_payload(arg0, "id")?;
    let removed = store.transact(&[Section::Draft], |data| {
        data.draft.remove_expense(&payload.id)
    })?;
    to_json(&removed)
}

pub(crate) fn shift_paid_debts(store: &AppStore) -> Result<Value, String> {
    store.read(|data| to_json(&paid_debts_today(data)))?
}

pub(crate) fn shift_toggle_paid_debt(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: SaleIdPayload = parse_payload(arg0, "saleId")?;
    let selected = store.transact(&[Section::Draft], |data| {
        let eligible = paid_debts_today(data);
        data.draft.toggle_paid_debt(&eligible, &payload.sale_id)
    })?;
    Ok(json!({ "saleId": payload.sale_id, "selected": selected }))
}

pub(crate) fn shift_reset(store: &AppStore) -> Result<Value, String> {
    store.transact(&[Section::Draft], |data| {
        data.draft.reset();
        Ok(shift_view(data))
    })
}

/// Close the shift: append the report and clear the draft in one step.
pub(crate) fn shift_close(store: &AppStore) -> Result<Value, String> {
    let report = store.transact(&[Section::Reports, Section::Draft], |data| {
        let summary = today_summary(data);
        let eligible = paid_debts_today(data);
        let report = shift_service::close_shift(&summary, &mut data.draft, &eligible, Utc::now());
        data.reports.push(report.clone());
        Ok(report)
    })?;
    to_json(&report)
}
