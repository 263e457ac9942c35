use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{parse_id, parse_payload, to_json};
use crate::settings::{DebtorInput, SettingsPatch};
use crate::store::{AppStore, Section};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebtorUpdatePayload {
    #[serde(alias = "debtorId", alias = "debtor_id")]
    id: String,
    #[serde(flatten)]
    input: DebtorInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoryPayload {
    name: String,
    #[serde(default)]
    color: Option<String>,
}

pub(crate) fn settings_get(store: &AppStore) -> Result<Value, String> {
    store.read(|data| to_json(&data.settings))?
}

pub(crate) fn settings_update(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let patch: SettingsPatch = parse_payload(arg0, "businessName")?;
    let settings = store.transact(&[Section::Settings], |data| {
        data.settings.apply(patch)?;
        Ok(data.settings.clone())
    })?;
    info!(
        business_name = %settings.business_name,
        apply_tax = settings.should_apply_tax,
        tax_rate = settings.tax_rate,
        "Settings updated"
    );
    to_json(&settings)
}

pub(crate) fn settings_debtor_add(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let input: DebtorInput = parse_payload(arg0, "name")?;
    let debtor = store.transact(&[Section::Settings], |data| data.settings.add_debtor(input))?;
    info!(debtor_id = %debtor.id, name = %debtor.name, limit = ?debtor.limit, "Debtor added");
    to_json(&debtor)
}

pub(crate) fn settings_debtor_update(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: DebtorUpdatePayload = parse_payload(arg0, "id")?;
    let debtor = store.transact(&[Section::Settings], |data| {
        data.settings.update_debtor(&payload.id, payload.input)
    })?;
    to_json(&debtor)
}

pub(crate) fn settings_debtor_remove(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let id = parse_id(arg0)?;
    let removed = store.transact(&[Section::Settings], |data| data.settings.remove_debtor(&id))?;
    info!(debtor_id = %removed.id, "Debtor removed");
    Ok(json!({ "success": true, "name": removed.name }))
}

pub(crate) fn settings_category_add(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let payload: CategoryPayload = parse_payload(arg0, "name")?;
    let category = store.transact(&[Section::Settings], |data| {
        data.settings.add_category(&payload.name, payload.color)
    })?;
    to_json(&category)
}

pub(crate) fn settings_category_remove(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let id = parse_id(arg0)?;
    let removed = store.transact(&[Section::Settings], |data| data.settings.remove_category(&id))?;
    Ok(json!({ "success": true, "name": removed.name }))
}
