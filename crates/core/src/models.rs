use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// A payable order travelling through the gateway.
///
/// The transaction id stays empty until the provider accepts a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    uuid: Uuid,
    amount: u64,
    #[serde(default)]
    details: BTreeMap<String, String>,
    transaction_id: Option<String>,
}

impl Invoice {
    pub fn new(amount: u64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            amount,
            details: BTreeMap::new(),
            transaction_id: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Attach a transaction id known from elsewhere, e.g. a callback.
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn set_transaction_id(&mut self, transaction_id: impl Into<String>) {
        self.transaction_id = Some(transaction_id.into());
    }
}

/// Per-merchant gateway configuration. Built once and handed to a driver.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub merchant_id: String,
    pub callback_url: String,
    pub api_purchase_url: String,
    pub api_payment_url: String,
    pub api_verification_url: String,
    pub description: String,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("merchant_id", &"<redacted>")
            .field("callback_url", &self.callback_url)
            .field("api_purchase_url", &self.api_purchase_url)
            .field("api_payment_url", &self.api_payment_url)
            .field("api_verification_url", &self.api_verification_url)
            .field("description", &self.description)
            .finish()
    }
}

/// Proof of payment produced by a successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    driver: String,
    reference_id: String,
    date: DateTime<Utc>,
    #[serde(default)]
    details: BTreeMap<String, String>,
}

impl Receipt {
    pub fn new(driver: impl Into<String>, reference_id: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            reference_id: reference_id.into(),
            date: Utc::now(),
            details: BTreeMap::new(),
        }
    }

    pub fn driver(&self) -> &str {
        &self.driver
    }

    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }
}
