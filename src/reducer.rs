//! The app state and its single transition function.
//!
//! `reduce` never fails and never validates: callers check stock and input
//! first (see `catalog`, `cart`, `checkout`) and only dispatch actions that are
//! known to be valid. Keeping the transition pure makes every rule testable
//! without storage.

use serde::{Deserialize, Serialize};

use crate::models::{CartItem, Product, Sale};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub cart: Vec<CartItem>,
    /// Newest first.
    #[serde(default)]
    pub sales: Vec<Sale>,
}

impl AppState {
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn sale(&self, id: &str) -> Option<&Sale> {
        self.sales.iter().find(|s| s.id == id)
    }

    pub fn cart_quantity(&self, product_id: &str) -> i64 {
        self.cart
            .iter()
            .find(|item| item.product.id == product_id)
            .map(|item| item.quantity)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    InitData {
        products: Option<Vec<Product>>,
        sales: Option<Vec<Sale>>,
    },
    AddProduct(Product),
    UpdateProduct(Product),
    DeleteProduct(String),
    AddToCart {
        product: Product,
        quantity: i64,
    },
    UpdateCartItem {
        product_id: String,
        quantity: i64,
    },
    RemoveFromCart(String),
    ClearCart,
    /// Records the sale, decrements stock for each line and empties the cart.
    AddSale(Sale),
    UpdateSale(Sale),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::InitData { .. } => "INIT_DATA",
            Action::AddProduct(_) => "ADD_PRODUCT",
            Action::UpdateProduct(_) => "UPDATE_PRODUCT",
            Action::DeleteProduct(_) => "DELETE_PRODUCT",
            Action::AddToCart { .. } => "ADD_TO_CART",
            Action::UpdateCartItem { .. } => "UPDATE_CART_ITEM",
            Action::RemoveFromCart(_) => "REMOVE_FROM_CART",
            Action::ClearCart => "CLEAR_CART",
            Action::AddSale(_) => "ADD_SALE",
            Action::UpdateSale(_) => "UPDATE_SALE",
        }
    }

    /// Whether the action changes anything that is persisted.
    pub fn touches_catalog_or_ledger(&self) -> bool {
        !matches!(
            self,
            Action::AddToCart { .. }
                | Action::UpdateCartItem { .. }
                | Action::RemoveFromCart(_)
                | Action::ClearCart
        )
    }
}

pub fn reduce(state: AppState, action: Action) -> AppState {
    let mut state = state;
    match action {
        Action::InitData { products, sales } => {
            if let Some(products) = products {
                state.products = products;
            }
            if let Some(sales) = sales {
                state.sales = sales;
            }
        }
        Action::AddProduct(product) => {
            state.products.push(product);
        }
        Action::UpdateProduct(product) => {
            for existing in state.products.iter_mut() {
                if existing.id == product.id {
                    *existing = product.clone();
                }
            }
            for item in state.cart.iter_mut() {
                if item.product.id == product.id {
                    item.product = product.clone();
                }
            }
        }
        Action::DeleteProduct(product_id) => {
            state.products.retain(|p| p.id != product_id);
            state.cart.retain(|item| item.product.id != product_id);
        }
        Action::AddToCart { product, quantity } => {
            match state
                .cart
                .iter_mut()
                .find(|item| item.product.id == product.id)
            {
                Some(item) => item.quantity += quantity,
                None => state.cart.push(CartItem { product, quantity }),
            }
        }
        Action::UpdateCartItem {
            product_id,
            quantity,
        } => {
            for item in state.cart.iter_mut() {
                if item.product.id == product_id {
                    item.quantity = quantity;
                }
            }
        }
        Action::RemoveFromCart(product_id) => {
            state.cart.retain(|item| item.product.id != product_id);
        }
        Action::ClearCart => {
            state.cart.clear();
        }
        Action::AddSale(sale) => {
            for product in state.products.iter_mut() {
                let sold: i64 = sale
                    .items
                    .iter()
                    .filter(|item| item.product.id == product.id)
                    .map(|item| item.quantity)
                    .sum();
                if sold > 0 {
                    product.stock -= sold;
                    product.updated_at = sale.created_at;
                }
            }
            state.sales.insert(0, sale);
            state.cart.clear();
        }
        Action::UpdateSale(sale) => {
            for existing in state.sales.iter_mut() {
                if existing.id == sale.id {
                    *existing = sale.clone();
                }
            }
        }
    }
    state
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, TimeZone, Utc};

    use crate::models::{PaymentMethod, Product, Sale, SaleItem};

    pub fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    pub fn product(id: &str, price: f64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {id}"),
            description: None,
            price,
            stock,
            barcode: None,
            category: "Cleaners".to_string(),
            image: None,
            cost: None,
            created_at: ts(1, 8),
            updated_at: ts(1, 8),
        }
    }

    pub fn sale(id: &str, method: PaymentMethod, final_total: f64) -> Sale {
        Sale {
            id: id.to_string(),
            items: Vec::new(),
            total: final_total,
            tax: 0.0,
            discount: 0.0,
            final_total,
            payment_method: method,
            is_debt: method == PaymentMethod::Debt,
            is_frozen: false,
            debtor_name: None,
            customer_name: None,
            customer_phone: None,
            discount_reason: None,
            notes: None,
            created_at: ts(10, 12),
            updated_at: None,
        }
    }

    pub fn debt_sale(id: &str, debtor: &str, final_total: f64) -> Sale {
        let mut s = sale(id, PaymentMethod::Debt, final_total);
        s.debtor_name = Some(debtor.to_string());
        s
    }

    pub fn sale_with_line(id: &str, product: &Product, quantity: i64) -> Sale {
        let mut s = sale(id, PaymentMethod::Cash, product.price * quantity as f64);
        s.items.push(SaleItem {
            product: product.clone(),
            quantity,
            price: product.price,
        });
        s
    }
}
