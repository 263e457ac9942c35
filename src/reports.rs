//! Read-side queries over the shift report history and the sale ledger.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Sale, ShiftReport};
use crate::shifts::local_date;

/// Inclusive local-date range; either bound may be open.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(default, alias = "start_date", alias = "from")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, alias = "end_date", alias = "to")]
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| day >= start)
            && self.end_date.map_or(true, |end| day <= end)
    }
}

fn needle(search: Option<&str>) -> Option<String> {
    search
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
}

/// Reports in the range whose notes contain `search`, newest first.
pub fn filter_reports(reports: &[ShiftReport], range: &DateRange, search: Option<&str>) -> Vec<ShiftReport> {
    let needle = needle(search);
    let mut out: Vec<ShiftReport> = reports
        .iter()
        .filter(|r| range.contains(local_date(r.date)))
        .filter(|r| {
            needle
                .as_deref()
                .map_or(true, |n| r.notes.to_lowercase().contains(n))
        })
        .cloned()
        .collect();
    out.sort_by(|a, b| b.date.cmp(&a.date));
    out
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTotals {
    pub report_count: usize,
    pub sales_count: usize,
    pub total_sales: f64,
    pub total_cash_sales: f64,
    pub total_card_sales: f64,
    pub total_debt_sales: f64,
    pub total_expenses: f64,
    pub total_variance: f64,
}

pub fn report_totals(reports: &[ShiftReport]) -> ReportTotals {
    reports.iter().fold(ReportTotals::default(), |mut t, r| {
        t.report_count += 1;
        t.sales_count += r.sales_count;
        t.total_sales += r.total_sales;
        t.total_cash_sales += r.total_cash_sales;
        t.total_card_sales += r.total_card_sales;
        t.total_debt_sales += r.total_debt_sales;
        t.total_expenses += r.expenses;
        t.total_variance += r.cash_shortage;
        t
    })
}

/// Sales history search: id prefix, customer or debtor name, or phone digits.
pub fn search_sales(sales: &[Sale], range: &DateRange, search: Option<&str>) -> Vec<Sale> {
    let needle = needle(search);
    sales
        .iter()
        .filter(|s| range.contains(local_date(s.created_at)))
        .filter(|s| match needle.as_deref() {
            None => true,
            Some(n) => {
                s.id.to_lowercase().starts_with(n)
                    || s
                        .customer_name
                        .as_deref()
                        .is_some_and(|c| c.to_lowercase().contains(n))
                    || s
                        .debtor_name
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(n))
                    || s.customer_phone.as_deref().is_some_and(|p| p.contains(n))
            }
        })
        .cloned()
        .collect()
}
