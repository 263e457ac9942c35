//! Diagnostics module for Nora POS.
//!
//! Provides:
//! - **Data dir resolution**: `NORA_POS_DATA_DIR`, else the platform data dir.
//! - **About info**: version, build timestamp, git SHA, platform, storage stats.
//! - **Log rotation helpers**: used by `lib.rs` to configure rolling log files.

use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::store::AppStore;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of log files to retain.
pub const MAX_LOG_FILES: usize = 10;

/// Overrides the data directory when set.
pub const DATA_DIR_ENV: &str = "NORA_POS_DATA_DIR";

const APP_IDENTIFIER: &str = "com.nora.pos";

/// Prefix of the rolling log files.
pub const LOG_FILE_PREFIX: &str = "pos";

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Directory holding the database, logs and exported documents.
pub fn resolve_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    let base = std::env::var("XDG_DATA_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            #[cfg(target_os = "windows")]
            {
                std::env::var("LOCALAPPDATA")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("."))
            }
            #[cfg(not(target_os = "windows"))]
            {
                PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
                    .join(".local")
                    .join("share")
            }
        });
    base.join(APP_IDENTIFIER)
}

pub fn get_log_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("logs")
}

// ---------------------------------------------------------------------------
// About info
// ---------------------------------------------------------------------------

/// Returns version, build timestamp, git SHA, platform info and store stats.
pub fn get_about_info(store: &AppStore) -> Result<Value, String> {
    let (schema_version, db_path) = {
        let conn = store.db.conn.lock().map_err(|e| e.to_string())?;
        let version: i32 = conn
            .query_row(
                "SELECT COALESCE(MAX(version), 0) FROM schema_version",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);
        (version, store.db.db_path.to_string_lossy().to_string())
    };
    let (products, sales, reports) = store.read(|data| {
        (
            data.state.products.len(),
            data.state.sales.len(),
            data.reports.len(),
        )
    })?;

    Ok(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "buildTimestamp": env!("BUILD_TIMESTAMP"),
        "gitSha": env!("BUILD_GIT_SHA"),
        "platform": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "rustVersion": env!("CARGO_PKG_RUST_VERSION"),
        "dataDir": store.data_dir().to_string_lossy(),
        "dbPath": db_path,
        "schemaVersion": schema_version,
        "counts": {
            "products": products,
            "sales": sales,
            "shiftReports": reports,
        },
        "storageWarnings": store.load_warnings(),
    }))
}

// ---------------------------------------------------------------------------
// Log rotation
// ---------------------------------------------------------------------------

/// Prune old log files, keeping only the most recent `MAX_LOG_FILES`.
pub fn prune_old_logs(log_dir: &Path) {
    if !log_dir.exists() {
        return;
    }

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    if let Ok(entries) = fs::read_dir(log_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let is_log = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with(&format!("{LOG_FILE_PREFIX}.")));
            if is_log {
                let modified = entry
                    .metadata()
                    .ok()
                    .and_then(|m| m.modified().ok())
                    .unwrap_or(std::time::UNIX_EPOCH);
                log_files.push((path, modified));
            }
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to prune log file {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_about_info_has_required_fields() {
        let store = crate::store::test_store();
        let info = get_about_info(&store).unwrap();
        assert!(info.get("version").is_some());
        assert!(info.get("buildTimestamp").is_some());
        assert!(info.get("gitSha").is_some());
        assert_eq!(info["schemaVersion"], 2);
        assert_eq!(info["counts"]["sales"], 0);
    }

    #[test]
    #[serial]
    fn test_data_dir_env_override() {
        std::env::set_var(DATA_DIR_ENV, "/tmp/nora-override");
        assert_eq!(resolve_data_dir(), PathBuf::from("/tmp/nora-override"));
        std::env::remove_var(DATA_DIR_ENV);
    }

    #[test]
    #[serial]
    fn test_data_dir_falls_back_to_xdg() {
        std::env::remove_var(DATA_DIR_ENV);
        let previous = std::env::var_os("XDG_DATA_HOME");
        std::env::set_var("XDG_DATA_HOME", "/tmp/xdg-nora");
        assert_eq!(
            resolve_data_dir(),
            PathBuf::from("/tmp/xdg-nora").join("com.nora.pos")
        );
        match previous {
            Some(v) => std::env::set_var("XDG_DATA_HOME", v),
            None => std::env::remove_var("XDG_DATA_HOME"),
        }
    }

    #[test]
    fn test_prune_keeps_newest_logs() {
        let dir = std::env::temp_dir().join(format!("nora_logs_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        for i in 0..(MAX_LOG_FILES + 3) {
            std::fs::write(dir.join(format!("pos.2026-01-{:02}", i + 1)), "x").unwrap();
        }
        std::fs::write(dir.join("other.txt"), "keep").unwrap();

        prune_old_logs(&dir);

        let remaining: Vec<_> = std::fs::read_dir(&dir)
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with("pos."))
            .collect();
        assert_eq!(remaining.len(), MAX_LOG_FILES);
        assert!(dir.join("other.txt").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
