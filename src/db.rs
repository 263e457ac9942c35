//! Local SQLite database layer for Nora POS.
//!
//! The web client kept its state in browser local storage as JSON blobs; this
//! layer keeps the same blobs in a `local_settings` key/value table (WAL mode)
//! and adds a small log of exported documents.

use chrono::Utc;
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info, warn};

/// Database connection plus the path it was opened from.
pub struct DbState {
    pub conn: Mutex<Connection>,
    pub db_path: PathBuf,
}

/// Current schema version. Bump when adding new migrations.
const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Initialize the database at `{data_dir}/pos.db`.
///
/// Creates the directory if needed, opens the connection, sets pragmas,
/// and runs any pending migrations. If the file cannot be opened it is moved
/// aside as `pos.db.corrupt-<ts>` (with its WAL and SHM files) and a fresh
/// database is created once.
pub fn init(data_dir: &Path) -> Result<DbState, String> {
    fs::create_dir_all(data_dir).map_err(|e| format!("Failed to create data dir: {e}"))?;

    let db_path = data_dir.join("pos.db");
    info!("Opening database at {}", db_path.display());

    let conn = match open_and_configure(&db_path) {
        Ok(c) => c,
        Err(first_err) => {
            warn!("Database open failed ({first_err}), moving it aside and retrying once");
            let moved = quarantine_db_files(&db_path)?;
            for path in &moved {
                error!(
                    path = %path.display(),
                    error = %first_err,
                    "Unreadable database file preserved"
                );
            }
            open_and_configure(&db_path)
                .map_err(|e| format!("Database open failed after retry: {e}"))?
        }
    };

    run_migrations(&conn)?;

    info!("Database initialized (schema v{CURRENT_SCHEMA_VERSION})");

    Ok(DbState {
        conn: Mutex::new(conn),
        db_path,
    })
}

/// In-memory database with the full schema. Used by tests across modules.
#[cfg(test)]
pub fn open_in_memory() -> Result<DbState, String> {
    let conn = Connection::open_in_memory().map_err(|e| format!("sqlite open: {e}"))?;
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA synchronous = NORMAL;",
    )
    .map_err(|e| format!("pragma setup: {e}"))?;
    run_migrations(&conn)?;
    Ok(DbState {
        conn: Mutex::new(conn),
        db_path: PathBuf::from(":memory:"),
    })
}

/// Rename `pos.db` and its `-wal`/`-shm` companions to `*.corrupt-<ts>`.
/// Returns the new paths. A rename failure aborts startup so nothing is lost.
fn quarantine_db_files(db_path: &Path) -> Result<Vec<PathBuf>, String> {
    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let mut moved = Vec::new();
    for path in [
        db_path.to_path_buf(),
        db_path.with_extension("db-wal"),
        db_path.with_extension("db-shm"),
    ] {
        if !path.exists() {
            continue;
        }
        let mut target = path.clone().into_os_string();
        target.push(format!(".corrupt-{stamp}"));
        let target = PathBuf::from(target);
        fs::rename(&path, &target)
            .map_err(|e| format!("Failed to move {} aside: {e}", path.display()))?;
        moved.push(target);
    }
    Ok(moved)
}

/// Open the database file and apply pragmas.
fn open_and_configure(path: &Path) -> Result<Connection, String> {
    let conn = Connection::open(path).map_err(|e| format!("sqlite open: {e}"))?;

    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;",
    )
    .map_err(|e| format!("pragma setup: {e}"))?;

    Ok(conn)
}

/// Run all pending migrations up to `CURRENT_SCHEMA_VERSION`.
fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT DEFAULT (datetime('now'))
        );",
    )
    .map_err(|e| format!("create schema_version: {e}"))?;

    let current: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current >= CURRENT_SCHEMA_VERSION {
        info!("Database schema up to date (v{current})");
        return Ok(());
    }

    info!("Migrating database from v{current} to v{CURRENT_SCHEMA_VERSION}");

    if current < 1 {
        migrate_v1(conn)?;
    }
    if current < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Migration v1: key/value store holding the JSON-encoded app state.
fn migrate_v1(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS local_settings (
            id TEXT PRIMARY KEY DEFAULT (lower(hex(randomblob(16)))),
            setting_category TEXT NOT NULL,
            setting_key TEXT NOT NULL,
            setting_value TEXT NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            updated_at TEXT DEFAULT (datetime('now')),
            UNIQUE(setting_category, setting_key)
        );

        CREATE INDEX IF NOT EXISTS idx_local_settings_cat_key
            ON local_settings(setting_category, setting_key);

        INSERT INTO schema_version (version) VALUES (1);
        ",
    )
    .map_err(|e| {
        error!("Migration v1 failed: {e}");
        format!("migration v1: {e}")
    })?;

    info!("Applied migration v1");
    Ok(())
}

/// Migration v2: log of exported receipt / shift report documents.
fn migrate_v2(conn: &Connection) -> Result<(), String> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS document_exports (
            id TEXT PRIMARY KEY,
            entity_type TEXT NOT NULL CHECK (entity_type IN ('receipt', 'shift_report')),
            entity_id TEXT NOT NULL,
            output_path TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_document_exports_entity
            ON document_exports(entity_type, entity_id);

        INSERT INTO schema_version (version) VALUES (2);
        ",
    )
    .map_err(|e| {
        error!("Migration v2 failed: {e}");
        format!("migration v2: {e}")
    })?;

    info!("Applied migration v2 (document_exports table)");
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings helpers
// ---------------------------------------------------------------------------

/// Get a single setting value.
pub fn get_setting(conn: &Connection, category: &str, key: &str) -> Option<String> {
    conn.query_row(
        "SELECT setting_value FROM local_settings WHERE setting_category = ?1 AND setting_key = ?2",
        params![category, key],
        |row| row.get(0),
    )
    .ok()
}

/// Insert or update a setting.
pub fn set_setting(
    conn: &Connection,
    category: &str,
    key: &str,
    value: &str,
) -> Result<(), String> {
    conn.execute(
        "INSERT INTO local_settings (setting_category, setting_key, setting_value, updated_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(setting_category, setting_key) DO UPDATE SET
            setting_value = excluded.setting_value,
            updated_at = excluded.updated_at",
        params![category, key, value],
    )
    .map_err(|e| format!("set_setting: {e}"))?;
    Ok(())
}

/// Delete one setting. Succeeds if it did not exist.
pub fn delete_setting(conn: &Connection, category: &str, key: &str) -> Result<(), String> {
    conn.execute(
        "DELETE FROM local_settings WHERE setting_category = ?1 AND setting_key = ?2",
        params![category, key],
    )
    .map_err(|e| format!("delete_setting: {e}"))?;
    Ok(())
}

/// Record a generated document file.
pub fn record_export(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
    output_path: &str,
) -> Result<String, String> {
    let id = uuid::Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO document_exports (id, entity_type, entity_id, output_path)
         VALUES (?1, ?2, ?3, ?4)",
        params![id, entity_type, entity_id, output_path],
    )
    .map_err(|e| format!("record export: {e}"))?;
    Ok(id)
}

/// Exported files for one entity, newest first.
pub fn list_exports(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<String>, String> {
    let mut stmt = conn
        .prepare(
            "SELECT output_path FROM document_exports
             WHERE entity_type = ?1 AND entity_id = ?2
             ORDER BY created_at DESC, rowid DESC",
        )
        .map_err(|e| format!("prepare exports: {e}"))?;
    let rows = stmt
        .query_map(params![entity_type, entity_id], |row| row.get::<_, String>(0))
        .map_err(|e| format!("query exports: {e}"))?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .expect("prepare table list");
        stmt.query_map([], |row| row.get(0))
            .expect("query tables")
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_migrations_to_latest() {
        let db = open_in_memory().expect("open");
        let conn = db.conn.lock().unwrap();
        let tables = table_names(&conn);
        assert!(tables.contains(&"local_settings".to_string()));
        assert!(tables.contains(&"document_exports".to_string()));

        let version: i32 = conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })
            .expect("read schema version");
        assert_eq!(version, CURRENT_SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let db = open_in_memory().expect("open");
        let conn = db.conn.lock().unwrap();
        run_migrations(&conn).expect("second run should succeed");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .expect("count versions");
        assert_eq!(count, CURRENT_SCHEMA_VERSION as i64);
    }

    #[test]
    fn test_wal_mode_on_file_db() {
        let dir = std::env::temp_dir().join("nora_pos_test_wal");
        let _ = std::fs::create_dir_all(&dir);
        let db_path = dir.join("test_wal.db");
        let _ = std::fs::remove_file(&db_path);

        let conn = open_and_configure(&db_path).expect("open temp db");
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .expect("read journal_mode");
        assert_eq!(mode.to_lowercase(), "wal");

        drop(conn);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_settings_crud() {
        let db = open_in_memory().expect("open");
        let conn = db.conn.lock().unwrap();

        set_setting(&conn, "local", "settings", "{\"a\":1}").expect("set");
        assert_eq!(
            get_setting(&conn, "local", "settings"),
            Some("{\"a\":1}".to_string())
        );

        set_setting(&conn, "local", "settings", "{\"a\":2}").expect("update");
        assert_eq!(
            get_setting(&conn, "local", "settings"),
            Some("{\"a\":2}".to_string())
        );

        delete_setting(&conn, "local", "settings").expect("delete");
        assert!(get_setting(&conn, "local", "settings").is_none());
    }

    #[test]
    fn test_export_log_rejects_unknown_entity() {
        let db = open_in_memory().expect("open");
        let conn = db.conn.lock().unwrap();
        record_export(&conn, "receipt", "sale-1", "/tmp/a.html").expect("record");
        assert!(record_export(&conn, "invoice", "sale-1", "/tmp/b.html").is_err());
        let paths = list_exports(&conn, "receipt", "sale-1").expect("list");
        assert_eq!(paths, vec!["/tmp/a.html".to_string()]);
    }

    #[test]
    fn test_unreadable_db_is_moved_aside_not_deleted() {
        let dir = std::env::temp_dir().join(format!("nora_pos_bad_db_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create dir");
        let garbage = "not a sqlite database\n".repeat(400);
        std::fs::write(dir.join("pos.db"), &garbage).expect("write garbage");

        let db = init(&dir).expect("init after quarantine");
        {
            let conn = db.conn.lock().unwrap();
            assert!(table_names(&conn).contains(&"local_settings".to_string()));
        }

        let kept: Vec<PathBuf> = std::fs::read_dir(&dir)
            .expect("read dir")
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("pos.db.corrupt-"))
            })
            .collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(std::fs::read_to_string(&kept[0]).expect("read kept"), garbage);

        drop(db);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
