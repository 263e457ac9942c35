use serde::Deserialize;
use serde_json::Value;

use super::{parse_payload, to_json};
use crate::reports::{self, DateRange};
use crate::store::AppStore;

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ReportsQueryPayload {
    #[serde(default, alias = "q", alias = "query")]
    search: Option<String>,
    #[serde(flatten)]
    range: DateRange,
}

pub(crate) fn reports_list(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: ReportsQueryPayload = parse_payload(arg0, "search")?;
    store.read(|data| {
        to_json(&reports::filter_reports(
            &data.reports,
            &payload.range,
            payload.search.as_deref(),
        ))
    })?
}

/// Column totals over the same filter as `reports_list`.
pub(crate) fn reports_totals(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: ReportsQueryPayload = parse_payload(arg0, "search")?;
    store.read(|data| {
        let filtered =
            reports::filter_reports(&data.reports, &payload.range, payload.search.as_deref());
        to_json(&reports::report_totals(&filtered))
    })?
}
