//! Document export.
//!
//! Receipts and shift reports are rendered to HTML and written under
//! `<data_dir>/receipts`. Each written file is logged in `document_exports`.
//! The store lock is held only while the document is built, never across
//! the file write.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::db;
use crate::error::PosError;
use crate::receipt_renderer::{self, LayoutConfig, ReceiptDoc, ShiftReportDoc};
use crate::store::AppStore;

/// Directory name under the app data dir where document files are written.
const RECEIPTS_DIR: &str = "receipts";

async fn write_document_file(
    data_dir: &Path,
    entity_type: &str,
    entity_id: &str,
    html: &str,
) -> Result<PathBuf, String> {
    let receipts_dir = data_dir.join(RECEIPTS_DIR);
    tokio::fs::create_dir_all(&receipts_dir)
        .await
        .map_err(|e| format!("create receipts dir: {e}"))?;
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let file_path = receipts_dir.join(format!("{entity_type}_{entity_id}_{timestamp}.html"));
    tokio::fs::write(&file_path, html)
        .await
        .map_err(|e| format!("write document: {e}"))?;
    Ok(file_path)
}

async fn export_document(
    store: &AppStore,
    entity_type: &str,
    entity_id: &str,
    html: String,
) -> Result<Value, String> {
    let path = match write_document_file(store.data_dir(), entity_type, entity_id, &html).await {
        Ok(path) => path,
        Err(e) => {
            error!(entity_type, entity_id = %entity_id, error = %e, "Document export failed");
            return Err(e);
        }
    };
    let path_str = path.to_string_lossy().to_string();
    let (export_id, history) = {
        let conn = store.db.conn.lock().map_err(|e| e.to_string())?;
        let id = db::record_export(&conn, entity_type, entity_id, &path_str)?;
        (id, db::list_exports(&conn, entity_type, entity_id)?)
    };
    info!(entity_type, entity_id = %entity_id, path = %path_str, "Document exported");
    Ok(json!({
        "success": true,
        "exportId": export_id,
        "path": path_str,
        "history": history,
    }))
}

/// Render the receipt for a sale and write it to disk.
pub async fn export_receipt(store: &AppStore, sale_id: &str) -> Result<Value, String> {
    let html = store.read(|data| {
        let sale = data
            .state
            .sale(sale_id)
            .ok_or_else(|| PosError::SaleNotFound(sale_id.to_string()))?;
        Ok::<_, PosError>(receipt_renderer::render_receipt_html(
            &ReceiptDoc::from_sale(sale),
            &LayoutConfig::from_settings(&data.settings),
        ))
    })??;
    export_document(store, "receipt", sale_id, html).await
}

/// Render a closed shift report and write it to disk.
pub async fn export_shift_report(store: &AppStore, report_id: &str) -> Result<Value, String> {
    let html = store.read(|data| {
        let report = data
            .reports
            .iter()
            .find(|r| r.id == report_id)
            .ok_or_else(|| PosError::Invalid(format!("shift report not found: {report_id}")))?;
        Ok::<_, PosError>(receipt_renderer::render_shift_report_html(
            &ShiftReportDoc::from_report(report),
            &LayoutConfig::from_settings(&data.settings),
        ))
    })??;
    export_document(store, "shift_report", report_id, html).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::fixtures::*;
    use crate::reducer::Action;

    fn temp_store() -> (AppStore, PathBuf) {
        let dir = std::env::temp_dir().join(format!("nora_export_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let db = db::init(&dir).unwrap();
        (AppStore::open(db, &dir), dir)
    }

    #[tokio::test]
    async fn receipt_export_writes_file_and_logs_it() {
        let (store, dir) = temp_store();
        let p = product("p1", 4.0, 3);
        store.dispatch(Action::AddProduct(p.clone())).unwrap();
        store.dispatch(Action::AddSale(sale_with_line("s1", &p, 2))).unwrap();

        let result = export_receipt(&store, "s1").await.unwrap();
        let path = result["path"].as_str().unwrap().to_string();
        assert!(path.contains("receipt_s1_"));
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("2x Product p1"));
        assert_eq!(result["history"], serde_json::json!([path.clone()]));

        let logged = {
            let conn = store.db.conn.lock().unwrap();
            db::list_exports(&conn, "receipt", "s1").unwrap()
        };
        assert_eq!(logged, vec![path]);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn unknown_ids_are_rejected() {
        let (store, dir) = temp_store();
        let err = export_receipt(&store, "missing").await.unwrap_err();
        assert_eq!(err, "Sale not found: missing");
        assert!(export_shift_report(&store, "missing").await.is_err());
        assert!(!dir.join(RECEIPTS_DIR).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
