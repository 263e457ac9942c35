//! Business settings: receipt header/footer, tax, authorized debtors and
//! product categories. Stored as one JSON record under `local/settings`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PosError, PosResult};
use crate::models::{AuthorizedDebtor, Category};

pub const DEFAULT_TAX_RATE: f64 = 15.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub business_name: String,
    pub location: String,
    pub receipt_footer: String,
    pub theme: String,
    pub should_apply_tax: bool,
    pub tax_rate: f64,
    pub authorized_debtors: Vec<AuthorizedDebtor>,
    pub categories: Vec<Category>,
    pub print_discount_reasons: bool,
    pub print_notes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let category = |id: &str, name: &str| Category {
            id: id.to_string(),
            name: name.to_string(),
            color: None,
        };
        Self {
            business_name: "Nora Cleaning Supplies".to_string(),
            location: "Sabha".to_string(),
            receipt_footer: "Thank you for your visit".to_string(),
            theme: "light".to_string(),
            should_apply_tax: false,
            tax_rate: DEFAULT_TAX_RATE,
            authorized_debtors: Vec::new(),
            categories: vec![
                category("cat1", "Cleaners"),
                category("cat2", "Fresheners"),
                category("cat3", "Household"),
                category("cat4", "Other"),
            ],
            print_discount_reasons: false,
            print_notes: false,
        }
    }
}

/// Partial update of the scalar settings; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, alias = "business_name")]
    pub business_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "receipt_footer")]
    pub receipt_footer: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default, alias = "should_apply_tax")]
    pub should_apply_tax: Option<bool>,
    #[serde(default, alias = "tax_rate")]
    pub tax_rate: Option<f64>,
    #[serde(default, alias = "print_discount_reasons")]
    pub print_discount_reasons: Option<bool>,
    #[serde(default, alias = "print_notes")]
    pub print_notes: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorInput {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub limit: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Settings {
    pub fn apply(&mut self, patch: SettingsPatch) -> PosResult<()> {
        if let Some(rate) = patch.tax_rate {
            if !(0.0..=100.0).contains(&rate) {
                return Err(PosError::Invalid(format!(
                    "tax rate must be between 0 and 100, got {rate}"
                )));
            }
            self.tax_rate = rate;
        }
        if let Some(name) = patch.business_name {
            let name = name.trim();
            if name.is_empty() {
                return Err(PosError::Invalid("business name cannot be empty".into()));
            }
            self.business_name = name.to_string();
        }
        if let Some(v) = patch.location {
            self.location = v.trim().to_string();
        }
        if let Some(v) = patch.receipt_footer {
            self.receipt_footer = v.trim().to_string();
        }
        if let Some(v) = patch.theme {
            self.theme = v;
        }
        if let Some(v) = patch.should_apply_tax {
            self.should_apply_tax = v;
        }
        if let Some(v) = patch.print_discount_reasons {
            self.print_discount_reasons = v;
        }
        if let Some(v) = patch.print_notes {
            self.print_notes = v;
        }
        Ok(())
    }

    /// Tax percentage to charge on a new sale.
    pub fn effective_tax_rate(&self) -> f64 {
        if self.should_apply_tax {
            self.tax_rate
        } else {
            0.0
        }
    }

    pub fn debtor(&self, name: &str) -> Option<&AuthorizedDebtor> {
        self.authorized_debtors.iter().find(|d| d.name == name)
    }

    pub fn add_debtor(&mut self, input: DebtorInput) -> PosResult<AuthorizedDebtor> {
        let debtor = validate_debtor(input, None)?;
        if self.debtor(&debtor.name).is_some() {
            return Err(PosError::Invalid(format!(
                "debtor \"{}\" already exists",
                debtor.name
            )));
        }
        self.authorized_debtors.push(debtor.clone());
        Ok(debtor)
    }

    pub fn update_debtor(&mut self, id: &str, input: DebtorInput) -> PosResult<AuthorizedDebtor> {
        let updated = validate_debtor(input, Some(id))?;
        if self
            .authorized_debtors
            .iter()
            .any(|d| d.id != id && d.name == updated.name)
        {
            return Err(PosError::Invalid(format!(
                "debtor \"{}\" already exists",
                updated.name
            )));
        }
        let slot = self
            .authorized_debtors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| PosError::Invalid(format!("debtor not found: {id}")))?;
        *slot = updated.clone();
        Ok(updated)
    }

    pub fn remove_debtor(&mut self, id: &str) -> PosResult<AuthorizedDebtor> {
        let idx = self
            .authorized_debtors
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| PosError::Invalid(format!("debtor not found: {id}")))?;
        Ok(self.authorized_debtors.remove(idx))
    }

    pub fn add_category(&mut self, name: &str, color: Option<String>) -> PosResult<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PosError::Invalid("category name cannot be empty".into()));
        }
        if self.categories.iter().any(|c| c.name == name) {
            return Err(PosError::Invalid(format!("category \"{name}\" already exists")));
        }
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            color,
        };
        self.categories.push(category.clone());
        Ok(category)
    }

    pub fn remove_category(&mut self, id: &str) -> PosResult<Category> {
        let idx = self
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| PosError::Invalid(format!("category not found: {id}")))?;
        Ok(self.categories.remove(idx))
    }
}

fn validate_debtor(input: DebtorInput, id: Option<&str>) -> PosResult<AuthorizedDebtor> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(PosError::Invalid("debtor name cannot be empty".into()));
    }
    if let Some(limit) = input.limit {
        if limit < 0.0 || !limit.is_finite() {
            return Err(PosError::Invalid(format!("invalid debt limit: {limit}")));
        }
    }
    Ok(AuthorizedDebtor {
        id: id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: name.to_string(),
        phone: input
            .phone
            .map(|p| crate::data_helpers::normalize_phone(&p))
            .filter(|p| !p.is_empty()),
        limit: input.limit,
        notes: input
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debtor(name: &str, limit: Option<f64>) -> DebtorInput {
        DebtorInput {
            name: name.to_string(),
            phone: Some("091 234 5678".to_string()),
            limit,
            notes: None,
        }
    }

    #[test]
    fn tax_is_zero_unless_enabled() {
        let mut s = Settings::default();
        assert_eq!(s.effective_tax_rate(), 0.0);
        s.apply(SettingsPatch {
            should_apply_tax: Some(true),
            tax_rate: Some(10.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(s.effective_tax_rate(), 10.0);
    }

    #[test]
    fn rejects_out_of_range_tax_rate() {
        let mut s = Settings::default();
        let err = s
            .apply(SettingsPatch {
                tax_rate: Some(120.0),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, PosError::Invalid(_)));
        assert_eq!(s.tax_rate, DEFAULT_TAX_RATE);
    }

    #[test]
    fn debtor_names_are_unique_and_trimmed() {
        let mut s = Settings::default();
        let ali = s.add_debtor(debtor("  Ali ", Some(100.0))).unwrap();
        assert_eq!(ali.name, "Ali");
        assert_eq!(ali.phone.as_deref(), Some("0912345678"));
        assert!(s.add_debtor(debtor("Ali", None)).is_err());
        assert_eq!(s.debtor("Ali").unwrap().limit, Some(100.0));
    }

    #[test]
    fn update_and_remove_debtor() {
        let mut s = Settings::default();
        let ali = s.add_debtor(debtor("Ali", Some(100.0))).unwrap();
        s.add_debtor(debtor("Omar", None)).unwrap();

        assert!(s.update_debtor(&ali.id, debtor("Omar", None)).is_err());
        let updated = s.update_debtor(&ali.id, debtor("Ali", Some(250.0))).unwrap();
        assert_eq!(updated.id, ali.id);
        assert_eq!(s.debtor("Ali").unwrap().limit, Some(250.0));

        s.remove_debtor(&ali.id).unwrap();
        assert!(s.debtor("Ali").is_none());
        assert!(s.remove_debtor(&ali.id).is_err());
    }

    #[test]
    fn negative_limit_rejected() {
        let mut s = Settings::default();
        assert!(s.add_debtor(debtor("Ali", Some(-1.0))).is_err());
    }

    #[test]
    fn categories_crud() {
        let mut s = Settings::default();
        let n = s.categories.len();
        let c = s.add_category("Soaps", Some("#fff".into())).unwrap();
        assert_eq!(s.categories.len(), n + 1);
        assert!(s.add_category("Soaps", None).is_err());
        s.remove_category(&c.id).unwrap();
        assert_eq!(s.categories.len(), n);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: Settings = serde_json::from_value(serde_json::json!({
            "businessName": "Shop",
            "authorizedDebtors": [{"id": "1", "name": "Ali", "limit": 50}]
        }))
        .unwrap();
        assert_eq!(s.business_name, "Shop");
        assert_eq!(s.tax_rate, DEFAULT_TAX_RATE);
        assert_eq!(s.categories.len(), 4);
        assert_eq!(s.debtor("Ali").unwrap().effective_limit(), Some(50.0));
    }
}
