//! The single in-process store.
//!
//! All mutable state sits behind one mutex. A mutation runs on a copy of the
//! state, persists the sections it touched, and only then replaces the live
//! state, so a rejected or unpersisted change leaves nothing behind.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rusqlite::Connection;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::data_helpers::{
    load_local_or_default, save_local_with, KEY_PRODUCTS, KEY_SALES, KEY_SETTINGS,
    KEY_SHIFT_DRAFT, KEY_SHIFT_REPORTS, LOCAL_CATEGORY,
};
use crate::db::{self, DbState};
use crate::error::{PosError, PosResult};
use crate::models::{Product, Sale, ShiftReport};
use crate::reducer::{reduce, Action, AppState};
use crate::settings::Settings;
use crate::shifts::ShiftDraft;

/// A persisted section of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Products,
    Sales,
    Settings,
    Reports,
    Draft,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Products,
        Section::Sales,
        Section::Settings,
        Section::Reports,
        Section::Draft,
    ];
}

#[derive(Debug, Clone, Default)]
pub struct StoreData {
    pub state: AppState,
    pub settings: Settings,
    /// Append-only, oldest first.
    pub reports: Vec<ShiftReport>,
    pub draft: ShiftDraft,
}

impl StoreData {
    pub fn dispatch(&mut self, action: Action) {
        debug!(action = action.name(), "Dispatch");
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }
}

pub struct AppStore {
    pub db: DbState,
    data_dir: PathBuf,
    data: Mutex<StoreData>,
    load_warnings: Vec<String>,
}

fn load_section<T: DeserializeOwned + Default>(
    db: &DbState,
    key: &str,
    warnings: &mut Vec<String>,
) -> T {
    let (value, warning) = load_local_or_default(db, key);
    warnings.extend(warning);
    value
}

impl AppStore {
    /// Load every section from the database. A missing or unreadable section
    /// starts from its default; unreadable ones are reported through
    /// [`AppStore::load_warnings`].
    pub fn open(db: DbState, data_dir: &Path) -> Self {
        let mut load_warnings = Vec::new();
        let products: Vec<Product> = load_section(&db, KEY_PRODUCTS, &mut load_warnings);
        let sales: Vec<Sale> = load_section(&db, KEY_SALES, &mut load_warnings);
        let mut data = StoreData {
            state: AppState::default(),
            settings: load_section(&db, KEY_SETTINGS, &mut load_warnings),
            reports: load_section(&db, KEY_SHIFT_REPORTS, &mut load_warnings),
            draft: load_section(&db, KEY_SHIFT_DRAFT, &mut load_warnings),
        };
        data.dispatch(Action::InitData {
            products: Some(products),
            sales: Some(sales),
        });
        info!(
            products = data.state.products.len(),
            sales = data.state.sales.len(),
            reports = data.reports.len(),
            warnings = load_warnings.len(),
            "Store loaded"
        );
        Self {
            db,
            data_dir: data_dir.to_path_buf(),
            data: Mutex::new(data),
            load_warnings,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Sections that could not be read at startup.
    pub fn load_warnings(&self) -> &[String] {
        &self.load_warnings
    }

    pub fn read<T>(&self, f: impl FnOnce(&StoreData) -> T) -> Result<T, String> {
        let guard = self.data.lock().map_err(|e| e.to_string())?;
        Ok(f(&guard))
    }

    /// Apply `f` to a copy of the data; persist `sections` in one SQLite
    /// transaction and commit on success.
    pub fn transact<T>(
        &self,
        sections: &[Section],
        f: impl FnOnce(&mut StoreData) -> PosResult<T>,
    ) -> Result<T, String> {
        let mut guard = self.data.lock().map_err(|e| e.to_string())?;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        if !sections.is_empty() {
            self.persist_all(&next, sections)
                .map_err(|e| PosError::Storage(e).to_string())?;
        }
        *guard = next;
        Ok(out)
    }

    /// Dispatch one action, persisting products and sales if it touched them.
    pub fn dispatch(&self, action: Action) -> Result<AppState, String> {
        let sections: &[Section] = if action.touches_catalog_or_ledger() {
            &[Section::Products, Section::Sales]
        } else {
            &[]
        };
        self.transact(sections, |data| {
            data.dispatch(action);
            Ok(data.state.clone())
        })
    }

    /// Write every section or none of them.
    fn persist_all(&self, data: &StoreData, sections: &[Section]) -> Result<(), String> {
        let conn = self.db.conn.lock().map_err(|e| e.to_string())?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| format!("begin transaction: {e}"))?;

        let result = sections
            .iter()
            .try_for_each(|section| persist(&conn, data, *section))
            .and_then(|()| {
                conn.execute_batch("COMMIT")
                    .map_err(|e| format!("commit: {e}"))
            });

        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                warn!(sections = ?sections, error = %e, "Persist rolled back");
                Err(e)
            }
        }
    }
}

fn persist(conn: &Connection, data: &StoreData, section: Section) -> Result<(), String> {
    match section {
        Section::Products => save_local_with(conn, KEY_PRODUCTS, &data.state.products),
        Section::Sales => save_local_with(conn, KEY_SALES, &data.state.sales),
        Section::Settings => save_local_with(conn, KEY_SETTINGS, &data.settings),
        Section::Reports => save_local_with(conn, KEY_SHIFT_REPORTS, &data.reports),
        Section::Draft if data.draft == ShiftDraft::default() => {
            db::delete_setting(conn, LOCAL_CATEGORY, KEY_SHIFT_DRAFT)
        }
        Section::Draft => save_local_with(conn, KEY_SHIFT_DRAFT, &data.draft),
    }
}

#[cfg(test)]
pub(crate) fn test_store() -> AppStore {
    let db = crate::db::open_in_memory().unwrap();
    AppStore::open(db, &std::env::temp_dir().join("nora_pos_test_store"))
}
