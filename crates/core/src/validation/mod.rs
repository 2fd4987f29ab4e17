mod rules;

use crate::models::{Invoice, Settings};

/// Check an invoice before it is sent to the provider.
pub fn validate(invoice: &Invoice) -> Result<(), Vec<String>> {
    let mut errs = Vec::new();
    if let Err(mut re) = rules::invoice_checks(invoice) {
        errs.append(&mut re);
    }
    if errs.is_empty() {
        Ok(())
    } else {
        Err(errs)
    }
}

pub fn validate_settings(settings: &Settings) -> Result<(), Vec<String>> {
    rules::settings_checks(settings)
}
