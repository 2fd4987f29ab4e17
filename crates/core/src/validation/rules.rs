use crate::models::{Invoice, Settings};

pub fn invoice_checks(invoice: &Invoice) -> Result<(), Vec<String>> {
    let mut errs = Vec::new();

    if invoice.amount() == 0 {
        errs.push("amount: must be greater than zero".to_string());
    }

    for (key, value) in invoice.details() {
        if key.trim().is_empty() {
            errs.push(format!("details: empty key for value {value:?}"));
        }
    }

    if let Some(id) = invoice.transaction_id() {
        if id.is_empty() {
            errs.push("transaction_id: must not be empty when set".to_string());
        }
    }

    if errs.is_empty() {
        Ok(())
    } else {
        Err(errs)
    }
}

pub fn settings_checks(settings: &Settings) -> Result<(), Vec<String>> {
    let mut errs = Vec::new();

    if settings.merchant_id.trim().is_empty() {
        errs.push("merchant_id: missing".to_string());
    }

    let urls = [
        ("callback_url", &settings.callback_url),
        ("api_purchase_url", &settings.api_purchase_url),
        ("api_payment_url", &settings.api_payment_url),
        ("api_verification_url", &settings.api_verification_url),
    ];
    for (name, url) in urls {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            errs.push(format!("{name}: expected an http(s) URL, got {url:?}"));
        }
    }

    if errs.is_empty() {
        Ok(())
    } else {
        Err(errs)
    }
}
