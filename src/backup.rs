//! Full-state JSON backup.
//!
//! A backup carries each persisted section as an optional field so a partial
//! file (for example one with only products) restores just that section.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PosError, PosResult};
use crate::models::{Product, Sale, ShiftReport};
use crate::settings::Settings;

pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales: Option<Vec<Sale>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_reports: Option<Vec<ShiftReport>>,
}

fn default_version() -> u32 {
    BACKUP_VERSION
}

impl Backup {
    pub fn capture(
        products: &[Product],
        sales: &[Sale],
        settings: &Settings,
        shift_reports: &[ShiftReport],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            version: BACKUP_VERSION,
            exported_at: Some(now),
            products: Some(products.to_vec()),
            sales: Some(sales.to_vec()),
            settings: Some(settings.clone()),
            shift_reports: Some(shift_reports.to_vec()),
        }
    }

    /// Parse and validate a backup before anything is replaced.
    pub fn parse(value: Value) -> PosResult<Self> {
        if !value.is_object() {
            return Err(PosError::Invalid("backup must be a JSON object".into()));
        }
        let backup: Backup = serde_json::from_value(value)
            .map_err(|e| PosError::Invalid(format!("malformed backup: {e}")))?;
        if backup.version > BACKUP_VERSION {
            return Err(PosError::Invalid(format!(
                "backup version {} is newer than supported version {BACKUP_VERSION}",
                backup.version
            )));
        }
        if backup.products.is_none()
            && backup.sales.is_none()
            && backup.settings.is_none()
            && backup.shift_reports.is_none()
        {
            return Err(PosError::Invalid("backup contains no data".into()));
        }
        Ok(backup)
    }

    /// Names of the sections this backup will replace.
    pub fn sections(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.products.is_some() {
            out.push("products");
        }
        if self.sales.is_some() {
            out.push("sales");
        }
        if self.settings.is_some() {
            out.push("settings");
        }
        if self.shift_reports.is_some() {
            out.push("shiftReports");
        }
        out
    }
}
