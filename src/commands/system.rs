use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use super::{parse_payload, to_json};
use crate::backup::Backup;
use crate::reducer::Action;
use crate::shifts::{today, ShiftDraft};
use crate::store::{AppStore, Section};
use crate::{analytics, diagnostics, print, value_str};

pub(crate) fn dashboard_stats(store: &AppStore) -> Result<Value, String> {
    store.read(|data| {
        to_json(&analytics::dashboard_stats(
            &data.state.products,
            &data.state.sales,
            today(),
        ))
    })?
}

pub(crate) fn backup_export(store: &AppStore) -> Result<Value, String> {
    let backup = store.read(|data| {
        Backup::capture(
            &data.state.products,
            &data.state.sales,
            &data.settings,
            &data.reports,
            Utc::now(),
        )
    })?;
    info!(
        products = backup.products.as_ref().map_or(0, Vec::len),
        sales = backup.sales.as_ref().map_or(0, Vec::len),
        "Backup exported"
    );
    to_json(&backup)
}

/// Replace every section present in the backup. The cart and the shift draft
/// are cleared either way.
pub(crate) fn backup_import(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let raw = match arg0 {
        Some(Value::String(text)) => {
            serde_json::from_str(&text).map_err(|e| format!("Invalid backup JSON: {e}"))?
        }
        Some(v) => v,
        None => return Err("Missing backup payload".into()),
    };
    let backup = Backup::parse(raw)?;
    let sections = backup.sections();
    store.transact(&Section::ALL, |data| {
        data.dispatch(Action::ClearCart);
        data.dispatch(Action::InitData {
            products: backup.products,
            sales: backup.sales,
        });
        if let Some(settings) = backup.settings {
            data.settings = settings;
        }
        if let Some(reports) = backup.shift_reports {
            data.reports = reports;
        }
        data.draft = ShiftDraft::default();
        Ok(())
    })?;
    info!(sections = ?sections, "Backup imported");
    Ok(json!({ "success": true, "sections": sections }))
}

pub(crate) async fn export_receipt(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: Value = parse_payload(arg0, "saleId")?;
    let sale_id = value_str(&payload, &["saleId", "sale_id", "id"]).ok_or("Missing saleId")?;
    print::export_receipt(store, &sale_id).await
}

pub(crate) async fn export_shift_report(
    store: &AppStore,
    arg0: Option<Value>,
) -> Result<Value, String> {
    let payload: Value = parse_payload(arg0, "reportId")?;
    let report_id =
        value_str(&payload, &["reportId", "report_id", "id"]).ok_or("Missing reportId")?;
    print::export_shift_report(store, &report_id).await
}

pub(crate) fn app_about(store: &AppStore) -> Result<Value, String> {
    diagnostics::get_about_info(store)
}

/// Sections that failed to load at startup and were reset to defaults.
pub(crate) fn storage_warnings(store: &AppStore) -> Result<Value, String> {
    Ok(json!({ "warnings": store.load_warnings() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::fixtures::*;
    use crate::store::test_store;

    #[test]
    fn backup_round_trip_clears_cart_and_draft() {
        let source = test_store();
        let p = product("p1", 3.0, 9);
        source.dispatch(Action::AddProduct(p.clone())).unwrap();
        source.dispatch(Action::AddSale(debt_sale("s1", "Ali", 30.0))).unwrap();
        let exported = backup_export(&source).unwrap();

        let target = test_store();
        target.dispatch(Action::AddProduct(product("old", 1.0, 1))).unwrap();
        target
            .dispatch(Action::AddToCart {
                product: product("old", 1.0, 1),
                quantity: 1,
            })
            .unwrap();
        target
            .transact(&[Section::Draft], |d| {
                d.draft.notes = "unfinished".into();
                Ok(())
            })
            .unwrap();

        let result = backup_import(&target, Some(Value::String(exported.to_string()))).unwrap();
        assert_eq!(result["sections"].as_array().unwrap().len(), 4);
        target
            .read(|d| {
                assert_eq!(d.state.products.len(), 1);
                assert_eq!(d.state.products[0].id, "p1");
                assert_eq!(d.state.sales.len(), 1);
                assert!(d.state.cart.is_empty());
                assert_eq!(d.draft, ShiftDraft::default());
            })
            .unwrap();
    }

    #[test]
    fn invalid_backup_leaves_state_alone() {
        let store = test_store();
        store.dispatch(Action::AddProduct(product("p1", 1.0, 1))).unwrap();
        assert!(backup_import(&store, Some(json!({"products": 5}))).is_err());
        assert!(backup_import(&store, Some(Value::String("{oops".into()))).is_err());
        assert_eq!(store.read(|d| d.state.products.len()).unwrap(), 1);
    }

    #[test]
    fn storage_warnings_lists_unreadable_sections() {
        let db = crate::db::open_in_memory().unwrap();
        {
            let conn = db.conn.lock().unwrap();
            crate::db::set_setting(&conn, "local", "sales", "not json").unwrap();
        }
        let store = AppStore::open(db, std::path::Path::new("/tmp"));
        let result = storage_warnings(&store).unwrap();
        let warnings = result["warnings"].as_array().unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].as_str().unwrap().contains("sales"));

        assert!(storage_warnings(&test_store()).unwrap()["warnings"]
            .as_array()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn dashboard_counts_low_stock() {
        let store = test_store();
        store.dispatch(Action::AddProduct(product("p1", 1.0, 1))).unwrap();
        let stats = dashboard_stats(&store).unwrap();
        assert_eq!(stats["lowStockCount"], 1);
        assert_eq!(stats["lastSevenDays"].as_array().unwrap().len(), 7);
    }
}
