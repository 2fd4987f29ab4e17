use super::{
    callback::CallbackParams, redirect::RedirectionForm, Driver, GatewayError, HttpRequest,
    HttpTransport,
};
use async_trait::async_trait;
use paystar_core::{
    parsing::{is_numeric, is_success_token},
    status::translate_status,
    validation, Invoice, Receipt, Settings,
};
use std::sync::Arc;

pub const GATEWAY_NAME: &str = "paystar";

/// Paystar driver.
///
/// The protocol has three phases:
/// - purchase: POST the invoice to the create endpoint, the body is either a
///   transaction id or a numeric error code
/// - pay: send the payer with a plain GET to the payment page for that id
/// - verify: POST the id back once the payer returns; the body `1` means paid
#[derive(Clone)]
pub struct Paystar {
    settings: Settings,
    transport: Arc<dyn HttpTransport>,
}

impl Paystar {
    pub fn new(settings: Settings, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    fn purchase_form(&self, invoice: &Invoice) -> Vec<(String, String)> {
        let mut form = vec![("amount".to_string(), invoice.amount().to_string())];

        if let Some(email) = invoice.detail("email") {
            form.push(("email".to_string(), email.to_string()));
        }
        if let Some(phone) = invoice.detail("mobile").or_else(|| invoice.detail("phone")) {
            form.push(("phone".to_string(), phone.to_string()));
        }

        let desc = invoice
            .detail("description")
            .unwrap_or(self.settings.description.as_str());

        form.push(("pin".to_string(), self.settings.merchant_id.clone()));
        form.push(("desc".to_string(), desc.to_string()));
        form.push(("callback".to_string(), self.settings.callback_url.clone()));
        form
    }

    fn verification_form(&self, invoice: &Invoice, transid: &str) -> Vec<(String, String)> {
        vec![
            ("amount".to_string(), invoice.amount().to_string()),
            ("pin".to_string(), self.settings.merchant_id.clone()),
            ("transid".to_string(), transid.to_string()),
        ]
    }
}

#[async_trait]
impl Driver for Paystar {
    fn name(&self) -> &'static str {
        GATEWAY_NAME
    }

    async fn purchase(&self, invoice: &mut Invoice) -> Result<String, GatewayError> {
        validation::validate(invoice).map_err(GatewayError::InvalidInvoice)?;

        let request = HttpRequest::post_form(
            self.settings.api_purchase_url.as_str(),
            self.purchase_form(invoice),
        );
        let body = self.transport.send(request).await?.body;

        if is_numeric(&body) {
            tracing::warn!(
                invoice = %invoice.uuid(),
                code = %body,
                "paystar rejected purchase"
            );
            return Err(GatewayError::PurchaseFailed(
                translate_status(&body).to_string(),
            ));
        }

        invoice.set_transaction_id(body.as_str());
        tracing::info!(
            invoice = %invoice.uuid(),
            transaction_id = %body,
            "paystar purchase created"
        );

        Ok(body)
    }

    fn pay(&self, invoice: &Invoice) -> Result<RedirectionForm, GatewayError> {
        let transaction_id = invoice
            .transaction_id()
            .ok_or(GatewayError::MissingTransactionId)?;
        let pay_url = format!("{}{}", self.settings.api_payment_url, transaction_id);

        Ok(RedirectionForm::get(pay_url))
    }

    async fn verify(
        &self,
        invoice: &Invoice,
        callback: Option<&CallbackParams>,
    ) -> Result<Receipt, GatewayError> {
        let transid = invoice
            .transaction_id()
            .or_else(|| callback.and_then(CallbackParams::transid))
            .ok_or(GatewayError::MissingTransactionId)?
            .to_string();

        let request = HttpRequest::post_form(
            self.settings.api_verification_url.as_str(),
            self.verification_form(invoice, &transid),
        );
        let body = self.transport.send(request).await?.body;

        if !is_success_token(&body) {
            tracing::warn!(
                transaction_id = %transid,
                code = %body,
                "paystar refused verification"
            );
            return Err(GatewayError::InvalidPayment(
                translate_status(&body).to_string(),
            ));
        }

        tracing::info!(transaction_id = %transid, "paystar payment verified");
        Ok(Receipt::new(GATEWAY_NAME, transid))
    }
}
