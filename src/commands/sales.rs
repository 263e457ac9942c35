use serde::Deserialize;
use serde_json::Value;

use super::{parse_id, parse_payload, to_json};
use crate::error::PosError;
use crate::reports::{self, DateRange};
use crate::store::AppStore;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SalesQueryPayload {
    #[serde(default, alias = "q", alias = "query")]
    search: Option<String>,
    #[serde(flatten)]
    range: DateRange,
    #[serde(default)]
    limit: Option<usize>,
}

pub(crate) fn sales_list(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: SalesQueryPayload = parse_payload(arg0, "search")?;
    store.read(|data| {
        let limit = payload.limit.unwrap_or(usize::MAX);
        to_json(&data.state.sales.iter().take(limit).collect::<Vec<_>>())
    })?
}

pub(crate) fn sales_search(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: SalesQueryPayload = parse_payload(arg0, "search")?;
    store.read(|data| {
        let mut found =
            reports::search_sales(&data.state.sales, &payload.range, payload.search.as_deref());
        if let Some(limit) = payload.limit {
            found.truncate(limit);
        }
        to_json(&found)
    })?
}

pub(crate) fn sales_get(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let id = parse_id(arg0)?;
    store.read(|data| match data.state.sale(&id) {
        Some(sale) => to_json(sale),
        None => Err(PosError::SaleNotFound(id.clone()).into()),
    })?
}
