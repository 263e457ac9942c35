//! Cart validation and totals. Quantities are bounded by the catalog stock
//! at the time the line is added or changed.

use crate::error::{PosError, PosResult};
use crate::models::CartItem;
use crate::reducer::{Action, AppState};

/// Validate adding `quantity` of a product and build the action.
///
/// The merged cart quantity (existing line + new) must fit in stock.
pub fn add_to_cart(state: &AppState, product_id: &str, quantity: i64) -> PosResult<Action> {
    if quantity <= 0 {
        return Err(PosError::Invalid(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    let product = state
        .product(product_id)
        .ok_or_else(|| PosError::ProductNotFound(product_id.to_string()))?;
    let requested = state
        .cart_quantity(product_id)
        .checked_add(quantity)
        .ok_or_else(|| PosError::Invalid(format!("quantity too large: {quantity}")))?;
    if !product.has_enough_stock(requested) {
        return Err(PosError::InsufficientStock {
            name: product.name.clone(),
            requested,
            available: product.stock,
        });
    }
    Ok(Action::AddToCart {
        product: product.clone(),
        quantity,
    })
}

/// Validate setting a cart line to `quantity`. Zero removes the line.
pub fn update_cart_item(state: &AppState, product_id: &str, quantity: i64) -> PosResult<Action> {
    if quantity < 0 {
        return Err(PosError::Invalid(format!(
            "quantity cannot be negative, got {quantity}"
        )));
    }
    let product = state
        .product(product_id)
        .ok_or_else(|| PosError::ProductNotFound(product_id.to_string()))?;
    if quantity == 0 {
        return Ok(Action::RemoveFromCart(product_id.to_string()));
    }
    if !product.has_enough_stock(quantity) {
        return Err(PosError::InsufficientStock {
            name: product.name.clone(),
            requested: quantity,
            available: product.stock,
        });
    }
    Ok(Action::UpdateCartItem {
        product_id: product_id.to_string(),
        quantity,
    })
}

pub fn cart_total(items: &[CartItem]) -> f64 {
    items
        .iter()
        .fold(0.0, |acc, item| acc + item.product.price * item.quantity as f64)
}

pub fn item_count(items: &[CartItem]) -> i64 {
    items.iter().map(|item| item.quantity).sum()
}

/// `(subtotal - discount) * (1 + tax / 100)`.
pub fn final_total(subtotal: f64, tax_percent: f64, discount: f64) -> f64 {
    let after_discount = subtotal - discount;
    after_discount + after_discount * tax_percent / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::fixtures::*;
    use crate::reducer::reduce;

    fn state_with_stock(stock: i64) -> AppState {
        AppState {
            products: vec![product("p1", 2.5, stock)],
            ..Default::default()
        }
    }

    #[test]
    fn add_respects_stock_including_existing_line() {
        let state = state_with_stock(5);
        let state = reduce(state.clone(), add_to_cart(&state, "p1", 3).unwrap());
        let err = add_to_cart(&state, "p1", 3).unwrap_err();
        assert_eq!(
            err,
            PosError::InsufficientStock {
                name: "Product p1".into(),
                requested: 6,
                available: 5,
            }
        );
        assert!(add_to_cart(&state, "p1", 2).is_ok());
    }

    #[test]
    fn huge_quantity_on_existing_line_is_rejected() {
        let state = state_with_stock(5);
        let state = reduce(state.clone(), add_to_cart(&state, "p1", 1).unwrap());
        assert!(matches!(
            add_to_cart(&state, "p1", i64::MAX),
            Err(PosError::Invalid(_))
        ));
        assert!(matches!(
            add_to_cart(&state, "p1", i64::MAX - 1),
            Err(PosError::InsufficientStock { .. })
        ));
        assert_eq!(state.cart_quantity("p1"), 1);
    }

    #[test]
    fn add_rejects_unknown_and_non_positive() {
        let state = state_with_stock(5);
        assert_eq!(
            add_to_cart(&state, "nope", 1).unwrap_err(),
            PosError::ProductNotFound("nope".into())
        );
        assert!(add_to_cart(&state, "p1", 0).is_err());
    }

    #[test]
    fn update_bounded_by_stock_and_zero_removes() {
        let state = state_with_stock(4);
        let state = reduce(state.clone(), add_to_cart(&state, "p1", 1).unwrap());
        assert!(update_cart_item(&state, "p1", 5).is_err());
        let state = reduce(state.clone(), update_cart_item(&state, "p1", 4).unwrap());
        assert_eq!(state.cart_quantity("p1"), 4);
        let state = reduce(state.clone(), update_cart_item(&state, "p1", 0).unwrap());
        assert!(state.cart.is_empty());
    }

    #[test]
    fn totals() {
        let state = state_with_stock(10);
        let state = reduce(state.clone(), add_to_cart(&state, "p1", 4).unwrap());
        assert_eq!(cart_total(&state.cart), 10.0);
        assert_eq!(item_count(&state.cart), 4);
        assert_eq!(final_total(100.0, 15.0, 20.0), 92.0);
        assert_eq!(final_total(100.0, 0.0, 0.0), 100.0);
    }
}
