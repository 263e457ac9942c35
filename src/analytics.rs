//! Dashboard figures computed from the in-memory state.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::catalog::low_stock;
use crate::models::{Product, Sale};
use crate::shifts::local_date;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
    pub sales_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStock {
    pub category: String,
    pub product_count: usize,
    pub units: i64,
    pub stock_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_sales: f64,
    pub sales_count: usize,
    pub today_sales: f64,
    pub today_sales_count: usize,
    /// Oldest first, ending today.
    pub last_seven_days: Vec<DailyTotal>,
    pub categories: Vec<CategoryStock>,
    pub product_count: usize,
    pub low_stock_count: usize,
}

pub fn dashboard_stats(products: &[Product], sales: &[Sale], today: NaiveDate) -> DashboardStats {
    let last_seven_days = (0..7)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let day_sales = sales.iter().filter(|s| local_date(s.created_at) == date);
            let (total, sales_count) =
                day_sales.fold((0.0, 0), |(t, n), s| (t + s.final_total, n + 1));
            DailyTotal {
                date,
                total,
                sales_count,
            }
        })
        .collect::<Vec<_>>();

    let today_entry = last_seven_days.last();

    DashboardStats {
        total_sales: sales.iter().fold(0.0, |acc, s| acc + s.final_total),
        sales_count: sales.len(),
        today_sales: today_entry.map_or(0.0, |d| d.total),
        today_sales_count: today_entry.map_or(0, |d| d.sales_count),
        categories: category_stock(products),
        product_count: products.len(),
        low_stock_count: low_stock(products).len(),
        last_seven_days,
    }
}

/// Stock value (`price * stock`) per category, sorted by category name.
pub fn category_stock(products: &[Product]) -> Vec<CategoryStock> {
    let mut out: Vec<CategoryStock> = Vec::new();
    for p in products {
        let name = if p.category.is_empty() {
            "Uncategorized"
        } else {
            p.category.as_str()
        };
        let existing = out.iter().position(|c| c.category == name);
        let idx = match existing {
            Some(idx) => idx,
            None => {
                out.push(CategoryStock {
                    category: name.to_string(),
                    product_count: 0,
                    units: 0,
                    stock_value: 0.0,
                });
                out.len() - 1
            }
        };
        let entry = &mut out[idx];
        entry.product_count += 1;
        entry.units += p.stock;
        entry.stock_value += p.price * p.stock as f64;
    }
    out.sort_by(|a, b| a.category.cmp(&b.category));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentMethod;
    use crate::reducer::fixtures::*;

    #[test]
    fn stats_cover_today_and_week() {
        let mut old = sale("old", PaymentMethod::Cash, 100.0);
        old.created_at = ts(1, 12);
        let mut yesterday = sale("y", PaymentMethod::Card, 20.0);
        yesterday.created_at = ts(9, 12);
        let sales = vec![
            sale("t1", PaymentMethod::Cash, 10.0),
            sale("t2", PaymentMethod::Cash, 5.0),
            yesterday,
            old,
        ];
        let mut freshener = product("f", 3.0, 2);
        freshener.category = "Fresheners".into();
        let products = vec![product("a", 2.0, 10), product("b", 1.0, 4), freshener];

        let today = local_date(ts(10, 12));
        let stats = dashboard_stats(&products, &sales, today);

        assert_eq!(stats.total_sales, 135.0);
        assert_eq!(stats.sales_count, 4);
        assert_eq!(stats.today_sales, 15.0);
        assert_eq!(stats.today_sales_count, 2);
        assert_eq!(stats.last_seven_days.len(), 7);
        assert_eq!(stats.last_seven_days[6].date, today);
        assert_eq!(stats.last_seven_days[5].total, 20.0);
        assert_eq!(stats.low_stock_count, 2);

        assert_eq!(stats.categories.len(), 2);
        assert_eq!(stats.categories[0].category, "Cleaners");
        assert_eq!(stats.categories[0].stock_value, 24.0);
        assert_eq!(stats.categories[0].units, 14);
        assert_eq!(stats.categories[1].stock_value, 6.0);
    }
}
