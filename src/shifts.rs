//! Shift reconciliation for Nora POS.
//!
//! A shift is the span between two closes. Its sales are the ledger entries
//! created on the current local date; the cashier counts the drawer, records
//! expenses paid out of it, picks the debts settled today, and closes. The
//! working values live in a persisted [`ShiftDraft`] until close freezes them
//! into an append-only [`ShiftReport`].

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{PosError, PosResult};
use crate::models::{Expense, PaymentMethod, Sale, ShiftReport};

/// Variances smaller than this are treated as an exact match.
pub const VARIANCE_EPSILON: f64 = 0.005;

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSummary {
    pub sales_count: usize,
    pub total_sales: f64,
    pub total_cash_sales: f64,
    pub total_card_sales: f64,
    /// Outstanding debt sales plus any non-cash, non-card method.
    pub total_debt_sales: f64,
    /// Frozen debts. Reported apart and not part of `total_sales`.
    pub frozen_debt_sales: f64,
}

/// Partition sales into cash, card and debt-or-other buckets.
///
/// `isDebt` wins over the payment method, so a debt recorded as cash still
/// lands in the debt bucket. A frozen debt is not due and stays out of every
/// bucket.
pub fn summarize(sales: &[Sale]) -> ShiftSummary {
    let mut summary = ShiftSummary::default();
    for sale in sales {
        let amount = sale.final_total;
        if sale.is_debt && sale.is_frozen {
            summary.frozen_debt_sales += amount;
        } else if sale.is_debt {
            summary.total_debt_sales += amount;
        } else {
            match sale.payment_method {
                PaymentMethod::Cash => summary.total_cash_sales += amount,
                PaymentMethod::Card => summary.total_card_sales += amount,
                PaymentMethod::Debt | PaymentMethod::Other => summary.total_debt_sales += amount,
            }
        }
        summary.sales_count += 1;
    }
    summary.total_sales =
        summary.total_cash_sales + summary.total_card_sales + summary.total_debt_sales;
    summary
}

pub fn local_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&Local).date_naive()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Sales created on `day` (local time).
pub fn sales_on(sales: &[Sale], day: NaiveDate) -> Vec<Sale> {
    sales
        .iter()
        .filter(|s| local_date(s.created_at) == day)
        .cloned()
        .collect()
}

/// Debts settled on `day`: no longer a debt, still carry a debtor name, and
/// were last touched that day.
pub fn paid_debts_on(sales: &[Sale], day: NaiveDate) -> Vec<Sale> {
    sales
        .iter()
        .filter(|s| !s.is_debt && s.debtor_name.is_some() && local_date(s.last_touched()) == day)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Variance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceLabel {
    Matched,
    Surplus,
    Shortage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashVariance {
    pub expected: f64,
    pub expenses: f64,
    pub adjusted_expected: f64,
    pub counted: f64,
    pub variance: f64,
}

impl CashVariance {
    pub fn compute(cash_sales: f64, expenses: f64, counted: f64) -> Self {
        let adjusted_expected = cash_sales - expenses;
        Self {
            expected: cash_sales,
            expenses,
            adjusted_expected,
            counted,
            variance: counted - adjusted_expected,
        }
    }

    pub fn is_surplus(&self) -> bool {
        self.variance >= 0.0
    }

    pub fn label(&self) -> VarianceLabel {
        if self.variance.abs() < VARIANCE_EPSILON {
            VarianceLabel::Matched
        } else if self.variance > 0.0 {
            VarianceLabel::Surplus
        } else {
            VarianceLabel::Shortage
        }
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShiftDraft {
    pub counted_cash: f64,
    pub notes: String,
    pub expenses: Vec<Expense>,
    pub selected_paid_debts: Vec<String>,
}

impl ShiftDraft {
    pub fn total_expenses(&self) -> f64 {
        self.expenses.iter().fold(0.0, |acc, e| acc + e.amount)
    }

    pub fn set_counted_cash(&mut self, amount: f64) -> PosResult<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(PosError::Invalid(format!(
                "counted cash must be zero or more, got {amount}"
            )));
        }
        self.counted_cash = amount;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: &str) {
        self.notes = notes.to_string();
    }

    /// Record cash paid out of the drawer.
    ///
    /// `cash_sales` is the current cash bucket; the expense may not exceed
    /// what is left of it after earlier expenses.
    pub fn add_expense(
        &mut self,
        cash_sales: f64,
        amount: f64,
        reason: &str,
        now: DateTime<Utc>,
    ) -> PosResult<Expense> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(PosError::Invalid(format!(
                "expense amount must be positive, got {amount}"
            )));
        }
        let available = cash_sales - self.total_expenses();
        if amount > available {
            return Err(PosError::InsufficientDrawerCash {
                requested: amount,
                available,
            });
        }
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            amount,
            reason: reason.trim().to_string(),
            date: now,
        };
        debug!(expense_id = %expense.id, amount, "Expense recorded");
        self.expenses.push(expense.clone());
        Ok(expense)
    }

    pub fn remove_expense(&mut self, id: &str) -> PosResult<Expense> {
        let idx = self
            .expenses
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| PosError::ExpenseNotFound(id.to_string()))?;
        Ok(self.expenses.remove(idx))
    }

    /// Select or deselect a paid debt. Returns whether it is now selected.
    pub fn toggle_paid_debt(&mut self, eligible: &[Sale], sale_id: &str) -> PosResult<bool> {
        if !eligible.iter().any(|s| s.id == sale_id) {
            return Err(PosError::NotAPaidDebt(sale_id.to_string()));
        }
        if let Some(idx) = self.selected_paid_debts.iter().position(|id| id == sale_id) {
            self.selected_paid_debts.remove(idx);
            Ok(false)
        } else {
            self.selected_paid_debts.push(sale_id.to_string());
            Ok(true)
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Close
// ---------------------------------------------------------------------------

/// Freeze the summary and draft into a report and reset the draft.
///
/// `paid_debts` is the eligible list for the day; only the ids selected in
/// the draft are copied into the report.
pub fn close_shift(
    summary: &ShiftSummary,
    draft: &mut ShiftDraft,
    paid_debts: &[Sale],
    now: DateTime<Utc>,
) -> ShiftReport {
    let expenses = draft.total_expenses();
    let variance = CashVariance::compute(summary.total_cash_sales, expenses, draft.counted_cash);
    let selected: Vec<Sale> = paid_debts
        .iter()
        .filter(|s| draft.selected_paid_debts.contains(&s.id))
        .cloned()
        .collect();

    let report = ShiftReport {
        id: Uuid::new_v4().to_string(),
        date: now,
        sales_count: summary.sales_count,
        total_sales: summary.total_sales,
        total_cash_sales: summary.total_cash_sales,
        total_card_sales: summary.total_card_sales,
        total_debt_sales: summary.total_debt_sales,
        cash_in_drawer: draft.counted_cash,
        cash_shortage: variance.variance,
        expenses,
        paid_debts: selected,
        notes: draft.notes.clone(),
    };

    info!(
        report_id = %report.id,
        sales_count = report.sales_count,
        total_sales = report.total_sales,
        variance = report.cash_shortage,
        label = ?variance.label(),
        "Shift closed"
    );

    draft.reset();
    report
}
