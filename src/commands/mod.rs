//! Named command surface used by the web client.
//!
//! Every command takes an optional JSON payload and returns JSON or an error
//! string. Command names are snake_case `<area>_<verb>`.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::store::AppStore;

mod cart;
mod catalog;
mod checkout;
mod debts;
mod reports;
mod sales;
mod settings;
mod shifts;
mod system;

/// Every command name `invoke` accepts.
pub const COMMANDS: &[&str] = &[
    "catalog_list",
    "catalog_add",
    "catalog_update",
    "catalog_delete",
    "catalog_search",
    "cart_get",
    "cart_add",
    "cart_update",
    "cart_remove",
    "cart_clear",
    "checkout_preview",
    "checkout_submit",
    "sales_list",
    "sales_search",
    "sales_get",
    "debts_list",
    "debts_pay",
    "debts_freeze",
    "debts_balance",
    "shift_summary",
    "shift_set_counted_cash",
    "shift_set_notes",
    "shift_add_expense",
    "shift_remove_expense",
    "shift_paid_debts",
    "shift_toggle_paid_debt",
    "shift_reset",
    "shift_close",
    "reports_list",
    "reports_totals",
    "settings_get",
    "settings_update",
    "settings_debtor_add",
    "settings_debtor_update",
    "settings_debtor_remove",
    "settings_category_add",
    "settings_category_remove",
    "dashboard_stats",
    "backup_export",
    "backup_import",
    "export_receipt",
    "export_shift_report",
    "app_about",
    "storage_warnings",
];

pub async fn invoke(store: &AppStore, name: &str, arg0: Option<Value>) -> Result<Value, String> {
    debug!(command = %name, "Invoke");
    let result = match name {
        "catalog_list" => catalog::catalog_list(store, arg0),
        "catalog_add" => catalog::catalog_add(store, arg0),
        "catalog_update" => catalog::catalog_update(store, arg0),
        "catalog_delete" => catalog::catalog_delete(store, arg0),
        "catalog_search" => catalog::catalog_search(store, arg0),
        "cart_get" => cart::cart_get(store),
        "cart_add" => cart::cart_add(store, arg0),
        "cart_update" => cart::cart_update(store, arg0),
        "cart_remove" => cart::cart_remove(store, arg0),
        "cart_clear" => cart::cart_clear(store),
        "checkout_preview" => checkout::checkout_preview(store, arg0),
        "checkout_submit" => checkout::checkout_submit(store, arg0),
        "sales_list" => sales::sales_list(store, arg0),
        "sales_search" => sales::sales_search(store, arg0),
        "sales_get" => sales::sales_get(store, arg0),
        "debts_list" => debts::debts_list(store, arg0),
        "debts_pay" => debts::debts_pay(store, arg0),
        "debts_freeze" => debts::debts_freeze(store, arg0),
        "debts_balance" => debts::debts_balance(store, arg0),
        "shift_summary" => shifts::shift_summary(store),
        "shift_set_counted_cash" => shifts::shift_set_counted_cash(store, arg0),
        "shift_set_notes" => shifts::shift_set_notes(store, arg0),
        "shift_add_expense" => shifts::shift_add_expense(store, arg0),
        "shift_remove_expense" => shifts::shift_remove_expense(store, arg0),
        "shift_paid_debts" => shifts::shift_paid_debts(store),
        "shift_toggle_paid_debt" => shifts::shift_toggle_paid_debt(store, arg0),
        "shift_reset" => shifts::shift_reset(store),
        "shift_close" => shifts::shift_close(store),
        "reports_list" => reports::reports_list(store, arg0),
        "reports_totals" => reports::reports_totals(store, arg0),
        "settings_get" => settings::settings_get(store),
        "settings_update" => settings::settings_update(store, arg0),
        "settings_debtor_add" => settings::settings_debtor_add(store, arg0),
        "settings_debtor_update" => settings::settings_debtor_update(store, arg0),
        "settings_debtor_remove" => settings::settings_debtor_remove(store, arg0),
        "settings_category_add" => settings::settings_category_add(store, arg0),
        "settings_category_remove" => settings::settings_category_remove(store, arg0),
        "dashboard_stats" => system::dashboard_stats(store),
        "backup_export" => system::backup_export(store),
        "backup_import" => system::backup_import(store, arg0),
        "export_receipt" => system::export_receipt(store, arg0).await,
        "export_shift_report" => system::export_shift_report(store, arg0).await,
        "app_about" => system::app_about(store),
        "storage_warnings" => system::storage_warnings(store),
        _ => Err(format!("Unknown command: {name}")),
    };
    if let Err(e) = &result {
        warn!(command = %name, error = %e, "Command failed");
    }
    result
}

/// Parse a command payload. A bare string is accepted as `{ <id_key>: s }`;
/// a missing payload parses as `{}`.
pub(crate) fn parse_payload<T: DeserializeOwned>(
    arg0: Option<Value>,
    id_key: &str,
) -> Result<T, String> {
    let payload = match arg0 {
        Some(Value::String(id)) => {
            let mut obj = serde_json::Map::new();
            obj.insert(id_key.to_string(), Value::String(id));
            Value::Object(obj)
        }
        Some(Value::Null) | None => serde_json::json!({}),
        Some(v) => v,
    };
    serde_json::from_value(payload).map_err(|e| format!("Invalid payload: {e}"))
}

/// Serialize a command result.
pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, String> {
    serde_json::to_value(value).map_err(|e| format!("serialize result: {e}"))
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct IdPayload {
    #[serde(alias = "saleId", alias = "sale_id", alias = "productId", alias = "product_id")]
    pub id: String,
}

pub(crate) fn parse_id(arg0: Option<Value>) -> Result<String, String> {
    let parsed: IdPayload = parse_payload(arg0, "id")?;
    let id = parsed.id.trim().to_string();
    if id.is_empty() {
        return Err("Missing id".into());
    }
    Ok(id)
}
