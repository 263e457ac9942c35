use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, warn};

use crate::db;

/// Category under which the mirrored app state lives in `local_settings`.
pub(crate) const LOCAL_CATEGORY: &str = "local";

pub(crate) const KEY_PRODUCTS: &str = "products";
pub(crate) const KEY_SALES: &str = "sales";
pub(crate) const KEY_SETTINGS: &str = "settings";
pub(crate) const KEY_SHIFT_REPORTS: &str = "shiftReports";
pub(crate) const KEY_SHIFT_DRAFT: &str = "shiftDraft";

/// Suffix of the key an unreadable value is copied to before it can be
/// overwritten.
pub(crate) const CORRUPT_SUFFIX: &str = ".corrupt";

/// Raw JSON under a local key. Missing is `Null`; text that is not JSON is
/// an error.
pub(crate) fn read_local_json(db: &db::DbState, key: &str) -> Result<serde_json::Value, String> {
    let conn = db.conn.lock().map_err(|e| e.to_string())?;
    match db::get_setting(&conn, LOCAL_CATEGORY, key) {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| format!("parse {key}: {e}")),
        None => Ok(serde_json::Value::Null),
    }
}

/// Typed read of a local key. A missing key yields `Ok(None)`; a value that
/// does not match `T` is an error so the caller can decide how to degrade.
pub(crate) fn load_local<T: DeserializeOwned>(
    db: &db::DbState,
    key: &str,
) -> Result<Option<T>, String> {
    let value = read_local_json(db, key)?;
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value)
        .map(Some)
        .map_err(|e| format!("parse {key}: {e}"))
}

/// Typed read that falls back to `T::default()` on failure.
///
/// On failure the stored text is copied to `<key>.corrupt` and the second
/// element carries a message for the client.
pub(crate) fn load_local_or_default<T: DeserializeOwned + Default>(
    db: &db::DbState,
    key: &str,
) -> (T, Option<String>) {
    match load_local(db, key) {
        Ok(Some(v)) => (v, None),
        Ok(None) => (T::default(), None),
        Err(e) => {
            warn!(key = %key, error = %e, "Failed to load local state, using defaults");
            let message = match preserve_corrupt(db, key) {
                Ok(backup_key) => format!(
                    "Stored {key} could not be read ({e}); the original was kept under {backup_key}"
                ),
                Err(copy_err) => {
                    error!(key = %key, error = %copy_err, "Could not keep unreadable value");
                    format!("Stored {key} could not be read ({e})")
                }
            };
            (T::default(), Some(message))
        }
    }
}

fn preserve_corrupt(db: &db::DbState, key: &str) -> Result<String, String> {
    let conn = db.conn.lock().map_err(|e| e.to_string())?;
    let raw = db::get_setting(&conn, LOCAL_CATEGORY, key).unwrap_or_default();
    let backup_key = format!("{key}{CORRUPT_SUFFIX}");
    db::set_setting(&conn, LOCAL_CATEGORY, &backup_key, &raw)?;
    Ok(backup_key)
}

/// Serialize `value` under a local key on a connection the caller holds.
pub(crate) fn save_local_with<T: Serialize>(
    conn: &Connection,
    key: &str,
    value: &T,
) -> Result<(), String> {
    let json = serde_json::to_string(value).map_err(|e| format!("serialize {key}: {e}"))?;
    db::set_setting(conn, LOCAL_CATEGORY, key, &json)
}

#[cfg(test)]
pub(crate) fn save_local<T: Serialize>(db: &db::DbState, key: &str, value: &T) -> Result<(), String> {
    let conn = db.conn.lock().map_err(|e| e.to_string())?;
    save_local_with(&conn, key, value)
}

pub(crate) fn normalize_phone(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect::<String>()
}
