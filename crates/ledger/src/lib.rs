mod audit;
mod checkout;

pub use audit::AuditEvent;
pub use checkout::Checkout;

use anyhow::{anyhow, bail, Context, Result};
use audit::{read_audit_events, write_audit_event};
use chrono::{DateTime, Utc};
use paystar_core::{parsing::fingerprint, Invoice, PaymentEvent, PaymentState};
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub invoice_id: String,
    pub state: PaymentState,
    pub amount: u64,
    pub transaction_id: Option<String>,
    pub reference_id: Option<String>,
    pub last_error: Option<String>,
    pub request_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistent record of every invoice's walk through the payment lifecycle.
///
/// Trees: `payments` (invoice id -> record), `invoices` (invoice id ->
/// invoice), `transactions` (provider transaction id -> invoice id).
#[derive(Clone)]
pub struct Ledger {
    db: Db,
    audit_path: PathBuf,
}

impl Ledger {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create ledger dir {}", dir.display()))?;
        let db = sled::open(dir.join("db")).context("Failed to open ledger database")?;
        Ok(Self {
            db,
            audit_path: dir.join("audit.jsonl"),
        })
    }

    fn payments_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree("payments")?)
    }

    fn invoices_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree("invoices")?)
    }

    fn transactions_tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree("transactions")?)
    }

    /// Start tracking an invoice in state `new`.
    pub fn begin(&self, invoice: &Invoice) -> Result<PaymentRecord> {
        let invoice_id = invoice.uuid().to_string();
        let payments = self.payments_tree()?;
        if payments.contains_key(invoice_id.as_bytes())? {
            bail!("invoice already tracked: {invoice_id}");
        }

        let hash = fingerprint(invoice.amount(), invoice.details());
        let now = Utc::now();
        let rec = PaymentRecord {
            invoice_id: invoice_id.clone(),
            state: PaymentState::New,
            amount: invoice.amount(),
            transaction_id: None,
            reference_id: None,
            last_error: None,
            request_hash: hash,
            created_at: now,
            updated_at: now,
        };

        payments.insert(invoice_id.as_bytes(), serde_json::to_vec(&rec)?)?;
        self.save_invoice(invoice)?;

        self.audit(AuditEvent::started(&rec));
        Ok(rec)
    }

    pub fn save_invoice(&self, invoice: &Invoice) -> Result<()> {
        let invoices = self.invoices_tree()?;
        invoices.insert(
            invoice.uuid().to_string().as_bytes(),
            serde_json::to_vec(invoice)?,
        )?;
        Ok(())
    }

    pub fn invoice(&self, invoice_id: &str) -> Result<Option<Invoice>> {
        let invoices = self.invoices_tree()?;
        match invoices.get(invoice_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get(&self, invoice_id: &str) -> Result<Option<PaymentRecord>> {
        let payments = self.payments_tree()?;
        match payments.get(invoice_id.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn find_by_transaction(&self, transaction_id: &str) -> Result<Option<PaymentRecord>> {
        let transactions = self.transactions_tree()?;
        match transactions.get(transaction_id.as_bytes())? {
            Some(invoice_id) => {
                let invoice_id = String::from_utf8(invoice_id.to_vec())?;
                self.get(&invoice_id)
            }
            None => Ok(None),
        }
    }

    /// Move a payment along the state machine and record why.
    ///
    /// A provider transaction id already recorded for another invoice is
    /// refused.
    pub fn apply(&self, invoice_id: &str, event: &PaymentEvent) -> Result<PaymentRecord> {
        let transactions = self.transactions_tree()?;
        if let PaymentEvent::PurchaseSucceeded { transaction_id } = event {
            if let Some(owner) = transactions.get(transaction_id.as_bytes())? {
                if owner.as_ref() != invoice_id.as_bytes() {
                    bail!(
                        "transaction {transaction_id} is already recorded for invoice {}",
                        String::from_utf8_lossy(&owner)
                    );
                }
            }
        }

        let payments = self.payments_tree()?;
        let rec = update_state(&payments, invoice_id, |rec| {
            rec.state = rec.state.apply(event)?;
            rec.updated_at = Utc::now();
            match event {
                PaymentEvent::PurchaseSucceeded { transaction_id } => {
                    rec.transaction_id = Some(transaction_id.clone());
                    rec.last_error = None;
                }
                PaymentEvent::VerifySucceeded { reference_id } => {
                    rec.reference_id = Some(reference_id.clone());
                    rec.last_error = None;
                }
                PaymentEvent::PurchaseFailed { message } | PaymentEvent::VerifyFailed { message } => {
                    rec.last_error = Some(message.clone());
                }
                PaymentEvent::Redirected => {}
            }
            Ok(())
        })?;

        if let PaymentEvent::PurchaseSucceeded { transaction_id } = event {
            transactions.insert(transaction_id.as_bytes(), invoice_id.as_bytes())?;
        }

        self.audit(AuditEvent::transition(&rec, event));

        Ok(rec)
    }

    /// All tracked payments, newest first.
    pub fn list(&self) -> Result<Vec<PaymentRecord>> {
        let payments = self.payments_tree()?;
        let mut out = Vec::new();
        for item in payments.iter() {
            let (_k, v) = item?;
            let rec: PaymentRecord = serde_json::from_slice(&v)?;
            out.push(rec);
        }
        out.sort_by_key(|r| r.created_at);
        out.reverse();
        Ok(out)
    }

    pub fn audit_events(&self) -> Result<Vec<AuditEvent>> {
        read_audit_events(&self.audit_path)
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn audit(&self, event: AuditEvent) {
        if let Err(e) = write_audit_event(&self.audit_path, &event) {
            tracing::warn!(invoice_id = %event.invoice_id, error = %e, "audit write failed");
        }
    }
}

fn update_state<F>(payments: &sled::Tree, invoice_id: &str, f: F) -> Result<PaymentRecord>
where
    F: FnOnce(&mut PaymentRecord) -> Result<()>,
{
    let key = invoice_id.as_bytes();
    let existing = payments
        .get(key)?
        .ok_or_else(|| anyhow!("payment not found: {invoice_id}"))?;
    let mut rec: PaymentRecord = serde_json::from_slice(&existing)?;
    f(&mut rec)?;
    payments.insert(key, serde_json::to_vec(&rec)?)?;
    Ok(rec)
}
