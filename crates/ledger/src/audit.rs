use super::PaymentRecord;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use paystar_core::{PaymentEvent, PaymentState};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// One line of the append-only audit trail.
///
/// Payer details never appear here; the invoice is identified by its id and
/// the fingerprint of its amount and details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub invoice_id: String,
    pub request_hash: String,
    /// State after the change was applied.
    pub state: PaymentState,
    /// `None` on the entry written when tracking starts.
    pub change: Option<PaymentEvent>,
}

impl AuditEvent {
    pub fn started(rec: &PaymentRecord) -> Self {
        Self::entry(rec, None)
    }

    pub fn transition(rec: &PaymentRecord, event: &PaymentEvent) -> Self {
        Self::entry(rec, Some(event.clone()))
    }

    fn entry(rec: &PaymentRecord, change: Option<PaymentEvent>) -> Self {
        Self {
            timestamp: Utc::now(),
            invoice_id: rec.invoice_id.clone(),
            request_hash: rec.request_hash.clone(),
            state: rec.state,
            change,
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.change
            .as_ref()
            .map_or("payment_started", PaymentEvent::name)
    }

    /// Provider or validation message carried by a failure.
    pub fn error(&self) -> Option<&str> {
        match &self.change {
            Some(PaymentEvent::PurchaseFailed { message })
            | Some(PaymentEvent::VerifyFailed { message }) => Some(message),
            _ => None,
        }
    }
}

pub fn write_audit_event(path: &Path, event: &AuditEvent) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open audit log {}", path.display()))?;
    writeln!(file, "{}", serde_json::to_string(event)?)?;
    tracing::debug!(
        event_type = event.event_type(),
        invoice_id = %event.invoice_id,
        state = %event.state,
        "audit entry written"
    );
    Ok(())
}

pub fn read_audit_events(path: &Path) -> Result<Vec<AuditEvent>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)?;
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|line| serde_json::from_str(line).context("Corrupt audit entry"))
        .collect()
}
