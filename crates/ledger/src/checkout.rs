use super::{Ledger, PaymentRecord};
use anyhow::{anyhow, bail, Result};
use gateway::{CallbackParams, Driver, GatewayError, RedirectionForm};
use paystar_core::{Invoice, PaymentEvent, PaymentState, Receipt};
use std::sync::Arc;

/// Runs a driver and keeps the ledger in step with every phase.
///
/// Provider rejections and invalid invoices move the payment to `failed` and
/// are then returned as the original `GatewayError`. Transport failures leave
/// the state alone so the phase can be retried.
#[derive(Clone)]
pub struct Checkout {
    driver: Arc<dyn Driver>,
    ledger: Arc<Ledger>,
}

impl Checkout {
    pub fn new(driver: Arc<dyn Driver>, ledger: Arc<Ledger>) -> Self {
        Self { driver, ledger }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub async fn purchase(&self, invoice: &mut Invoice) -> Result<String> {
        let invoice_id = invoice.uuid().to_string();
        let record = match self.ledger.get(&invoice_id)? {
            Some(rec) => rec,
            None => self.ledger.begin(invoice)?,
        };
        if record.state != PaymentState::New {
            bail!("invoice {invoice_id} is already {}", record.state);
        }

        match self.driver.purchase(invoice).await {
            Ok(transaction_id) => {
                self.ledger.apply(
                    &invoice_id,
                    &PaymentEvent::PurchaseSucceeded {
                        transaction_id: transaction_id.clone(),
                    },
                )?;
                self.ledger.save_invoice(invoice)?;
                tracing::info!(
                    driver = self.driver.name(),
                    invoice_id = %invoice_id,
                    "payment purchased"
                );
                Ok(transaction_id)
            }
            Err(err) => {
                if settles(&err) {
                    self.ledger.apply(
                        &invoice_id,
                        &PaymentEvent::PurchaseFailed {
                            message: err.to_string(),
                        },
                    )?;
                }
                Err(err.into())
            }
        }
    }

    pub fn pay(&self, invoice_id: &str) -> Result<RedirectionForm> {
        let invoice = self.load_invoice(invoice_id)?;
        let form = self.driver.pay(&invoice)?;
        self.ledger.apply(invoice_id, &PaymentEvent::Redirected)?;
        Ok(form)
    }

    pub async fn verify(&self, invoice_id: &str) -> Result<Receipt> {
        let record = self.load_record(invoice_id)?;
        if !matches!(record.state, PaymentState::Purchased | PaymentState::Redirected) {
            bail!("invoice {invoice_id} cannot be verified while {}", record.state);
        }
        let invoice = self.load_invoice(invoice_id)?;

        match self.driver.verify(&invoice, None).await {
            Ok(receipt) => {
                self.ledger.apply(
                    invoice_id,
                    &PaymentEvent::VerifySucceeded {
                        reference_id: receipt.reference_id().to_string(),
                    },
                )?;
                tracing::info!(
                    driver = self.driver.name(),
                    invoice_id = %invoice_id,
                    "payment verified"
                );
                Ok(receipt)
            }
            Err(err) => {
                tracing::warn!(
                    driver = self.driver.name(),
                    invoice_id = %invoice_id,
                    error = %err,
                    "verify failed"
                );
                if settles(&err) {
                    self.ledger.apply(
                        invoice_id,
                        &PaymentEvent::VerifyFailed {
                            message: err.to_string(),
                        },
                    )?;
                }
                Err(err.into())
            }
        }
    }

    /// Verify the payment the provider redirected back to us.
    pub async fn verify_callback(&self, callback: &CallbackParams) -> Result<Receipt> {
        let transid = callback
            .transid()
            .ok_or(GatewayError::MissingTransactionId)?;
        let record = self
            .ledger
            .find_by_transaction(transid)?
            .ok_or_else(|| anyhow!("no payment recorded for transaction {transid}"))?;
        self.verify(&record.invoice_id).await
    }

    fn load_record(&self, invoice_id: &str) -> Result<PaymentRecord> {
        self.ledger
            .get(invoice_id)?
            .ok_or_else(|| anyhow!("unknown invoice {invoice_id}"))
    }

    fn load_invoice(&self, invoice_id: &str) -> Result<Invoice> {
        self.ledger
            .invoice(invoice_id)?
            .ok_or_else(|| anyhow!("unknown invoice {invoice_id}"))
    }
}

fn settles(err: &GatewayError) -> bool {
    err.is_rejection() || matches!(err, GatewayError::InvalidInvoice(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway::{mock::MockTransport, paystar::Paystar};
    use paystar_core::{status::UNKNOWN_ERROR, Settings};

    fn settings() -> Settings {
        Settings {
            merchant_id: "merchant-pin".into(),
            callback_url: "https://shop.test/callback".into(),
            api_purchase_url: "https://paystar.ir/api/create/".into(),
            api_payment_url: "https://paystar.ir/paying/".into(),
            api_verification_url: "https://paystar.ir/api/verify/".into(),
            description: "payment using paystar".into(),
        }
    }

    fn checkout() -> (tempfile::TempDir, Checkout, Arc<MockTransport>) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(Ledger::open(dir.path()).unwrap());
        let mock = MockTransport::new();
        let driver = Arc::new(Paystar::new(settings(), mock.clone()));
        (dir, Checkout::new(driver, ledger), mock)
    }

    #[tokio::test]
    async fn full_lifecycle_is_recorded() {
        let (_dir, checkout, mock) = checkout();
        mock.push_body("123456789a");
        mock.push_body("1");
        let mut invoice = Invoice::new(10_000).with_detail("email", "a@b.com");
        let id = invoice.uuid().to_string();

        let transid = checkout.purchase(&mut invoice).await.unwrap();
        let form = checkout.pay(&id).unwrap();
        let callback = CallbackParams::from_pairs([("transid", transid.as_str())]);
        let receipt = checkout.verify_callback(&callback).await.unwrap();

        assert_eq!(form.action, "https://paystar.ir/paying/123456789a");
        assert_eq!(receipt.reference_id(), "123456789a");
        let rec = checkout.ledger().get(&id).unwrap().unwrap();
        assert_eq!(rec.state, PaymentState::Verified);

        let kinds: Vec<_> = checkout
            .ledger()
            .audit_events()
            .unwrap()
            .into_iter()
            .map(|e| e.event_type())
            .collect();
        assert_eq!(
            kinds,
            ["payment_started", "purchase_succeeded", "redirected", "verify_succeeded"]
        );
    }

    #[tokio::test]
    async fn rejected_purchase_fails_the_payment() {
        let (_dir, checkout, mock) = checkout();
        mock.push_body("-12");
        let mut invoice = Invoice::new(10_000);
        let id = invoice.uuid().to_string();

        let err = checkout.purchase(&mut invoice).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<GatewayError>(),
            Some(GatewayError::PurchaseFailed(_))
        ));
        let rec = checkout.ledger().get(&id).unwrap().unwrap();
        assert_eq!(rec.state, PaymentState::Failed);
        assert!(checkout.purchase(&mut invoice).await.is_err());
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn transport_failure_keeps_payment_retryable() {
        let (_dir, checkout, mock) = checkout();
        mock.push_body("tx-7");
        mock.push_error("timeout");
        mock.push_body("1");
        let mut invoice = Invoice::new(300);
        let id = invoice.uuid().to_string();
        checkout.purchase(&mut invoice).await.unwrap();

        let err = checkout.verify(&id).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GatewayError>(),
            Some(GatewayError::Transport(_))
        ));
        assert_eq!(
            checkout.ledger().get(&id).unwrap().unwrap().state,
            PaymentState::Purchased
        );

        checkout.verify(&id).await.unwrap();
        assert_eq!(
            checkout.ledger().get(&id).unwrap().unwrap().state,
            PaymentState::Verified
        );
    }

    #[tokio::test]
    async fn invalid_payment_is_terminal() {
        let (_dir, checkout, mock) = checkout();
        mock.push_body("tx-8");
        mock.push_body("0");
        let mut invoice = Invoice::new(300);
        let id = invoice.uuid().to_string();
        checkout.purchase(&mut invoice).await.unwrap();

        let err = checkout.verify(&id).await.unwrap_err();
        assert_eq!(err.to_string(), UNKNOWN_ERROR);

        let rec = checkout.ledger().get(&id).unwrap().unwrap();
        assert_eq!(rec.state, PaymentState::Failed);
        assert_eq!(rec.last_error.as_deref(), Some(UNKNOWN_ERROR));

        assert!(checkout.verify(&id).await.is_err());
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn callback_for_unknown_transaction_is_rejected() {
        let (_dir, checkout, mock) = checkout();
        let callback = CallbackParams::from_pairs([("transid", "never-seen")]);

        assert!(checkout.verify_callback(&callback).await.is_err());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn reused_transaction_id_keeps_callbacks_on_the_first_invoice() {
        let (_dir, checkout, mock) = checkout();
        mock.push_body("tx-same");
        mock.push_body("tx-same");
        let mut first = Invoice::new(100);
        let mut second = Invoice::new(200);
        let first_id = first.uuid().to_string();

        checkout.purchase(&mut first).await.unwrap();
        let err = checkout.purchase(&mut second).await.unwrap_err();

        assert!(err.to_string().contains("already recorded"), "{err}");
        let owner = checkout.ledger().find_by_transaction("tx-same").unwrap().unwrap();
        assert_eq!(owner.invoice_id, first_id);
        let rec = checkout.ledger().get(&second.uuid().to_string()).unwrap().unwrap();
        assert_eq!(rec.state, PaymentState::New);
    }

    /// Provider whose payment page is reached by submitting a form.
    struct FormPostDriver;

    #[async_trait::async_trait]
    impl Driver for FormPostDriver {
        fn name(&self) -> &'static str {
            "form-post"
        }

        async fn purchase(&self, invoice: &mut Invoice) -> Result<String, GatewayError> {
            invoice.set_transaction_id("fp-1");
            Ok("fp-1".into())
        }

        fn pay(&self, invoice: &Invoice) -> Result<RedirectionForm, GatewayError> {
            let token = invoice
                .transaction_id()
                .ok_or(GatewayError::MissingTransactionId)?;
            let inputs = [("token".to_string(), token.to_string())].into();
            Ok(RedirectionForm::post("https://psp.test/start", inputs))
        }

        async fn verify(
            &self,
            invoice: &Invoice,
            _callback: Option<&CallbackParams>,
        ) -> Result<Receipt, GatewayError> {
            let token = invoice
                .transaction_id()
                .ok_or(GatewayError::MissingTransactionId)?;
            Ok(Receipt::new(self.name(), token))
        }
    }

    #[tokio::test]
    async fn any_driver_can_sit_behind_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = Arc::new(Ledger::open(dir.path()).unwrap());
        let checkout = Checkout::new(Arc::new(FormPostDriver), ledger);
        let mut invoice = Invoice::new(50);
        let id = invoice.uuid().to_string();

        checkout.purchase(&mut invoice).await.unwrap();
        let form = checkout.pay(&id).unwrap();
        let receipt = checkout.verify(&id).await.unwrap();

        assert!(!form.is_get());
        assert_eq!(form.inputs.get("token").map(String::as_str), Some("fp-1"));
        assert_eq!(form.to_json()["method"], "POST");
        assert_eq!(receipt.driver(), "form-post");
        assert_eq!(
            checkout.ledger().get(&id).unwrap().unwrap().state,
            PaymentState::Verified
        );
    }
}
