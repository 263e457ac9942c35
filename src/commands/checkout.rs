use chrono::Utc;
use serde_json::Value;
use tracing::info;

use super::{parse_payload, to_json};
use crate::checkout::{self, CheckoutForm, CheckoutOutcome};
use crate::reducer::Action;
use crate::store::{AppStore, Section};

pub(crate) fn checkout_preview(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let form: CheckoutForm = parse_payload(arg0, "paymentMethod")?;
    let preview = store.read(|data| checkout::preview(&data.state, &data.settings, &form))??;
    to_json(&preview)
}

/// Record the cart as a sale. A debt over the limit comes back as
/// `limitExceeded` and leaves the cart as it was.
pub(crate) fn checkout_submit(store: &AppStore, arg0: Option<Value>) -> Result<Value, String> {
    let form: CheckoutForm = parse_payload(arg0, "paymentMethod")?;
    let outcome = store.transact(&[Section::Products, Section::Sales], |data| {
        let outcome = checkout::build_sale(&data.state, &data.settings, &form, Utc::now())?;
        if let CheckoutOutcome::Completed { sale } = &outcome {
            data.dispatch(Action::AddSale(sale.clone()));
        }
        Ok(outcome)
    })?;
    match &outcome {
        CheckoutOutcome::Completed { sale } => info!(
            sale_id = %sale.id,
            payment_method = sale.payment_method.as_str(),
            final_total = sale.final_total,
            items = sale.items.len(),
            "Sale completed"
        ),
        CheckoutOutcome::LimitExceeded { .. } => {
            info!("Checkout held: debt limit exceeded")
        }
    }
    to_json(&outcome)
}
