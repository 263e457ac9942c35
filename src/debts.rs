//! Debtor balances and credit limits.
//!
//! A sale is an outstanding debt iff `is_debt && !is_frozen`. Only those sales
//! count toward a debtor's balance; frozen debts stay in the ledger with their
//! `final_total` intact but are not due.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{PosError, PosResult};
use crate::models::{PaymentMethod, Sale};
use crate::settings::Settings;

/// Sum of `final_total` over the debtor's outstanding debt sales.
pub fn debtor_balance(sales: &[Sale], debtor_name: &str) -> f64 {
    sales
        .iter()
        .filter(|s| s.debtor_is(debtor_name) && s.is_outstanding_debt())
        .fold(0.0, |acc, s| acc + s.final_total)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum DebtLimitCheck {
    /// No limit configured (or zero), or the debtor is not authorized.
    Unlimited,
    WithinLimit { limit: f64, projected: f64 },
    LimitExceeded {
        debtor: String,
        limit: f64,
        current: f64,
        projected: f64,
    },
}

impl DebtLimitCheck {
    pub fn is_exceeded(&self) -> bool {
        matches!(self, DebtLimitCheck::LimitExceeded { .. })
    }
}

/// Would adding `candidate_total` push the debtor past their limit?
///
/// The boundary is strict: a projected balance equal to the limit is allowed.
pub fn check_debt_limit(
    sales: &[Sale],
    settings: &Settings,
    debtor_name: &str,
    candidate_total: f64,
) -> DebtLimitCheck {
    let Some(limit) = settings
        .debtor(debtor_name)
        .and_then(|d| d.effective_limit())
    else {
        return DebtLimitCheck::Unlimited;
    };
    let current = debtor_balance(sales, debtor_name);
    let projected = current + candidate_total;
    if projected > limit {
        DebtLimitCheck::LimitExceeded {
            debtor: debtor_name.to_string(),
            limit,
            current,
            projected,
        }
    } else {
        DebtLimitCheck::WithinLimit { limit, projected }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorSummary {
    pub name: String,
    /// Outstanding (unfrozen) balance.
    pub total_debt: f64,
    pub frozen_debt: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<f64>,
    pub at_or_over_limit: bool,
    /// Every unpaid debt sale for this debtor, frozen ones included.
    pub sales: Vec<Sale>,
}

/// Group unpaid debt sales by debtor name, sorted by name.
///
/// `search` filters debtor names case-insensitively.
pub fn list_debtors(sales: &[Sale], settings: &Settings, search: Option<&str>) -> Vec<DebtorSummary> {
    let needle = search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    let mut out: Vec<DebtorSummary> = Vec::new();

    for sale in sales.iter().filter(|s| s.is_debt) {
        let Some(name) = sale.debtor_name.as_deref() else {
            continue;
        };
        if let Some(needle) = &needle {
            if !name.to_lowercase().contains(needle) {
                continue;
            }
        }
        let existing = out.iter().position(|d| d.name == name);
        let idx = match existing {
            Some(idx) => idx,
            None => {
                let limit = settings.debtor(name).and_then(|d| d.effective_limit());
                out.push(DebtorSummary {
                    name: name.to_string(),
                    total_debt: 0.0,
                    frozen_debt: 0.0,
                    limit,
                    at_or_over_limit: false,
                    sales: Vec::new(),
                });
                out.len() - 1
            }
        };
        let entry = &mut out[idx];
        if sale.is_frozen {
            entry.frozen_debt += sale.final_total;
        } else {
            entry.total_debt += sale.final_total;
        }
        entry.sales.push(sale.clone());
    }

    for entry in out.iter_mut() {
        entry.at_or_over_limit = entry.limit.is_some_and(|l| entry.total_debt >= l);
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    out
}

/// Settle a debt sale. Returns the updated sale; the caller dispatches it.
pub fn pay_debt(sale: &Sale, method: PaymentMethod, now: DateTime<Utc>) -> PosResult<Sale> {
    if !sale.is_debt {
        return Err(PosError::NotADebt(sale.id.clone()));
    }
    if !matches!(method, PaymentMethod::Cash | PaymentMethod::Card) {
        return Err(PosError::Invalid(format!(
            "debts can only be paid by cash or card, got {}",
            method.as_str()
        )));
    }
    let mut paid = sale.clone();
    paid.is_debt = false;
    paid.payment_method = method;
    paid.updated_at = Some(now);
    Ok(paid)
}

/// Freeze or unfreeze a debt sale without touching its amounts.
pub fn set_frozen(sale: &Sale, frozen: bool, now: DateTime<Utc>) -> PosResult<Sale> {
    if !sale.is_debt {
        return Err(PosError::NotADebt(sale.id.clone()));
    }
    let mut updated = sale.clone();
    updated.is_frozen = frozen;
    updated.updated_at = Some(now);
    Ok(updated)
}
