use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{parse_id, parse_payload, to_json};
use crate::catalog;
use crate::models::ProductInput;
use crate::reducer::Action;
use crate::store::{AppStore, Section};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CatalogQueryPayload {
    #[serde(default, alias = "q", alias = "search")]
    query: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default, alias = "low_stock")]
    low_stock: bool,
    #[serde(default)]
    barcode: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductUpdatePayload {
    #[serde(alias = "productId", alias = "product_id")]
    id: String,
    #[serde(flatten)]
    input: ProductInput,
}

pub(crate) fn catalog_list(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: CatalogQueryPayload = parse_payload(arg0, "category")?;
    store.read(|data| {
        let products = &data.state.products;
        if payload.low_stock {
            to_json(&catalog::low_stock(products))
        } else {
            to_json(&catalog::search(products, "", payload.category.as_deref()))
        }
    })?
}

pub(crate) fn catalog_search(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: CatalogQueryPayload = parse_payload(arg0, "query")?;
    store.read(|data| {
        let products = &data.state.products;
        if let Some(barcode) = payload.barcode.as_deref() {
            return to_json(&catalog::find_by_barcode(products, barcode));
        }
        to_json(&catalog::search(
            products,
            payload.query.as_deref().unwrap_or_default(),
            payload.category.as_deref(),
        ))
    })?
}

pub(crate) fn catalog_add(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let input: ProductInput = parse_payload(arg0, "name")?;
    let product = store.transact(&[Section::Products], |data| {
        let product = catalog::add_product(input, Utc::now())?;
        data.dispatch(Action::AddProduct(product.clone()));
        Ok(product)
    })?;
    info!(product_id = %product.id, name = %product.name, "Product added");
    to_json(&product)
}

pub(crate) fn catalog_update(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: ProductUpdatePayload = parse_payload(arg0, "id")?;
    let product = store.transact(&[Section::Products], |data| {
        let product = catalog::update_product(&data.state, &payload.id, payload.input, Utc::now())?;
        data.dispatch(Action::UpdateProduct(product.clone()));
        Ok(product)
    })?;
    info!(product_id = %product.id, "Product updated");
    to_json(&product)
}

pub(crate) fn catalog_delete(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let id = parse_id(arg0)?;
    store.transact(&[Section::Products], |data| {
        let action = catalog::delete_product(&data.state, &id)?;
        data.dispatch(action);
        Ok(())
    })?;
    info!(product_id = %id, "Product deleted");
    Ok(serde_json::json!({ "success": true }))
}
