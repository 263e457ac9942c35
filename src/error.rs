//! Domain errors. Every variant is a rejected user action: state is left
//! untouched and the message is shown to the cashier.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PosError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),
    #[error("Sale not found: {0}")]
    SaleNotFound(String),
    #[error("Expense not found: {0}")]
    ExpenseNotFound(String),
    #[error("Insufficient stock for \"{name}\": requested {requested}, available {available}")]
    InsufficientStock {
        name: String,
        requested: i64,
        available: i64,
    },
    #[error("Cart is empty")]
    EmptyCart,
    #[error("A discount reason is required when a discount is applied")]
    MissingDiscountReason,
    #[error("A debtor must be selected for a debt sale")]
    MissingDebtor,
    #[error("Expense amount {requested:.2} exceeds available drawer cash {available:.2}")]
    InsufficientDrawerCash { requested: f64, available: f64 },
    #[error("Sale {0} is not an outstanding debt")]
    NotADebt(String),
    #[error("Sale {0} was not paid today as a debt and cannot be listed as a paid debt")]
    NotAPaidDebt(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type PosResult<T> = Result<T, PosError>;

impl From<PosError> for String {
    fn from(err: PosError) -> Self {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = PosError::InsufficientStock {
            name: "Soap".into(),
            requested: 4,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for \"Soap\": requested 4, available 2"
        );
        let as_string: String = PosError::InsufficientDrawerCash {
            requested: 50.0,
            available: 12.5,
        }
        .into();
        assert!(as_string.contains("50.00"));
        assert!(as_string.contains("12.50"));
    }
}
