//! Product catalog operations. Each returns the action to dispatch; the store
//! applies and persists it.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{PosError, PosResult};
use crate::models::{Product, ProductInput};
use crate::reducer::{Action, AppState};

/// Products with fewer units than this are flagged as low stock.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

fn validate(input: &ProductInput) -> PosResult<()> {
    if input.name.trim().is_empty() {
        return Err(PosError::Invalid("product name cannot be empty".into()));
    }
    if !input.price.is_finite() || input.price < 0.0 {
        return Err(PosError::Invalid(format!("invalid price: {}", input.price)));
    }
    if input.stock < 0 {
        return Err(PosError::Invalid(format!("invalid stock: {}", input.stock)));
    }
    if let Some(cost) = input.cost {
        if !cost.is_finite() || cost < 0.0 {
            return Err(PosError::Invalid(format!("invalid cost: {cost}")));
        }
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn add_product(input: ProductInput, now: DateTime<Utc>) -> PosResult<Product> {
    validate(&input)?;
    Ok(Product {
        id: Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        description: non_empty(input.description),
        price: input.price,
        stock: input.stock,
        barcode: non_empty(input.barcode),
        category: input.category.trim().to_string(),
        image: non_empty(input.image),
        cost: input.cost,
        created_at: now,
        updated_at: now,
    })
}

/// Replace the editable fields of an existing product, keeping id and
/// `createdAt`.
pub fn update_product(
    state: &AppState,
    id: &str,
    input: ProductInput,
    now: DateTime<Utc>,
) -> PosResult<Product> {
    let existing = state
        .product(id)
        .ok_or_else(|| PosError::ProductNotFound(id.to_string()))?;
    validate(&input)?;
    Ok(Product {
        id: existing.id.clone(),
        name: input.name.trim().to_string(),
        description: non_empty(input.description),
        price: input.price,
        stock: input.stock,
        barcode: non_empty(input.barcode),
        category: input.category.trim().to_string(),
        image: non_empty(input.image),
        cost: input.cost,
        created_at: existing.created_at,
        updated_at: now,
    })
}

pub fn delete_product(state: &AppState, id: &str) -> PosResult<Action> {
    if state.product(id).is_none() {
        return Err(PosError::ProductNotFound(id.to_string()));
    }
    Ok(Action::DeleteProduct(id.to_string()))
}

/// Case-insensitive match on name or category; barcodes match exactly or by
/// prefix. An empty query returns everything.
pub fn search<'a>(products: &'a [Product], query: &str, category: Option<&str>) -> Vec<&'a Product> {
    let needle = query.trim().to_lowercase();
    products
        .iter()
        .filter(|p| category.map_or(true, |c| c.is_empty() || p.category == c))
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.category.to_lowercase().contains(&needle)
                || p
                    .barcode
                    .as_deref()
                    .is_some_and(|b| b.starts_with(query.trim()))
        })
        .collect()
}

pub fn find_by_barcode<'a>(products: &'a [Product], barcode: &str) -> Option<&'a Product> {
    let barcode = barcode.trim();
    products
        .iter()
        .find(|p| p.barcode.as_deref() == Some(barcode))
}

pub fn low_stock(products: &[Product]) -> Vec<&Product> {
    products
        .iter()
        .filter(|p| p.stock < LOW_STOCK_THRESHOLD)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::fixtures::*;

    fn input(name: &str, price: f64, stock: i64) -> ProductInput {
        ProductInput {
            name: name.to_string(),
            price,
            stock,
            category: "Cleaners".into(),
            barcode: Some(" 6281000 ".into()),
            description: Some("   ".into()),
            ..Default::default()
        }
    }

    #[test]
    fn add_assigns_id_and_trims() {
        let p = add_product(input(" Bleach ", 4.5, 10), ts(2, 9)).unwrap();
        assert!(!p.id.is_empty());
        assert_eq!(p.name, "Bleach");
        assert_eq!(p.barcode.as_deref(), Some("6281000"));
        assert!(p.description.is_none());
        assert_eq!(p.created_at, p.updated_at);
    }

    #[test]
    fn add_rejects_bad_input() {
        assert!(add_product(input("", 1.0, 1), ts(2, 9)).is_err());
        assert!(add_product(input("x", -1.0, 1), ts(2, 9)).is_err());
        assert!(add_product(input("x", 1.0, -1), ts(2, 9)).is_err());
    }

    #[test]
    fn update_keeps_identity() {
        let state = AppState {
            products: vec![product("p1", 1.0, 1)],
            ..Default::default()
        };
        let updated = update_product(&state, "p1", input("Soap", 2.0, 8), ts(5, 9)).unwrap();
        assert_eq!(updated.id, "p1");
        assert_eq!(updated.created_at, ts(1, 8));
        assert_eq!(updated.updated_at, ts(5, 9));
        assert_eq!(updated.stock, 8);
        assert!(update_product(&state, "nope", input("Soap", 2.0, 8), ts(5, 9)).is_err());
    }

    #[test]
    fn delete_requires_existing() {
        let state = AppState {
            products: vec![product("p1", 1.0, 1)],
            ..Default::default()
        };
        assert!(matches!(
            delete_product(&state, "p1"),
            Ok(Action::DeleteProduct(id)) if id == "p1"
        ));
        assert_eq!(
            delete_product(&state, "p2").unwrap_err(),
            PosError::ProductNotFound("p2".into())
        );
    }

    #[test]
    fn search_and_low_stock() {
        let mut a = product("a", 1.0, 2);
        a.name = "Glass Cleaner".into();
        a.barcode = Some("111222".into());
        let mut b = product("b", 1.0, 20);
        b.name = "Air Freshener".into();
        b.category = "Fresheners".into();
        let products = vec![a, b];

        assert_eq!(search(&products, "glass", None).len(), 1);
        assert_eq!(search(&products, "111", None)[0].id, "a");
        assert_eq!(search(&products, "fresh", None)[0].id, "b");
        assert_eq!(search(&products, "", Some("Fresheners")).len(), 1);
        assert_eq!(search(&products, "", None).len(), 2);
        assert_eq!(find_by_barcode(&products, "111222").map(|p| p.id.as_str()), Some("a"));

        let low = low_stock(&products);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "a");
    }
}
