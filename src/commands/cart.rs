use serde::Deserialize;
use serde_json::{json, Value};

use super::{parse_id, parse_payload};
use crate::cart;
use crate::reducer::{Action, AppState};
use crate::store::AppStore;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartLinePayload {
    #[serde(alias = "product_id", alias = "id")]
    product_id: String,
    #[serde(default = "default_quantity")]
    quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

fn cart_view(state: &AppState) -> Value {
    json!({
        "items": state.cart,
        "itemCount": cart::item_count(&state.cart),
        "subtotal": cart::cart_total(&state.cart),
    })
}

pub(crate) fn cart_get(store: &AppStore) -> Result<Value, String> {
    store.read(|data| cart_view(&data.state))
}

pub(crate) fn cart_add(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: CartLinePayload = parse_payload(arg0, "productId")?;
    store.transact(&[], |data| {
        let action = cart::add_to_cart(&data.state, &payload.product_id, payload.quantity)?;
        data.dispatch(action);
        Ok(cart_view(&data.state))
    })
}

pub(crate) fn cart_update(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: CartLinePayload = parse_payload(arg0, "productId")?;
    store.transact(&[], |data| {
        let action = cart::update_cart_item(&data.state, &payload.product_id, payload.quantity)?;
        data.dispatch(action);
        Ok(cart_view(&data.state))
    })
}

pub(crate) fn cart_remove(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let product_id = parse_id(arg0)?;
    store.transact(&[], |data| {
        data.dispatch(Action::RemoveFromCart(product_id));
        Ok(cart_view(&data.state))
    })
}

pub(crate) fn cart_clear(store: &AppStore) -> Result<Value, String> {
    store.transact(&[], |data| {
        data.dispatch(Action::ClearCart);
        Ok(cart_view(&data.state))
    })
}
