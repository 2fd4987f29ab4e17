use anyhow::{anyhow, Context, Result};
use paystar_core::Settings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "paystar";
const KEYCHAIN_SERVICE: &str = "paystar.merchant";
pub const MERCHANT_SECRET_KEY: &str = "merchant_id";
pub const MERCHANT_ENV_VAR: &str = "PAYSTAR_MERCHANT_ID";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_ledger_dir")]
    pub ledger_dir: PathBuf,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ledger_dir: default_ledger_dir(),
            transport: TransportConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    #[serde(default)]
    pub kind: TransportKind,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Which transport carries requests to the provider. Unknown values are a
/// load error so a typo never silently falls back to the simulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Mock,
    Http,
}

/// Provider endpoints and merchant-facing defaults. The merchant pin is not
/// stored here; see [`resolve_merchant_id`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub api_purchase_url: String,
    pub api_payment_url: String,
    pub api_verification_url: String,
    pub callback_url: String,
    pub description: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_purchase_url: "https://paystar.ir/api/create/".to_string(),
            api_payment_url: "https://paystar.ir/paying/".to_string(),
            api_verification_url: "https://paystar.ir/api/verify/".to_string(),
            callback_url: "http://yoursite.com/path/to".to_string(),
            description: "payment using paystar".to_string(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_ledger_dir() -> PathBuf {
    PathBuf::from(".paystar_ledger")
}

impl AppConfig {
    /// Driver settings for the given merchant pin.
    pub fn settings(&self, merchant_id: impl Into<String>) -> Settings {
        Settings {
            merchant_id: merchant_id.into(),
            callback_url: self.gateway.callback_url.clone(),
            api_purchase_url: self.gateway.api_purchase_url.clone(),
            api_payment_url: self.gateway.api_payment_url.clone(),
            api_verification_url: self.gateway.api_verification_url.clone(),
            description: self.gateway.description.clone(),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.transport.kind == TransportKind::Mock
    }
}

pub fn load() -> Result<AppConfig> {
    let cfg: AppConfig = confy::load(APP_NAME, None).context("Failed to load app config")?;
    Ok(cfg)
}

pub fn store(cfg: &AppConfig) -> Result<()> {
    confy::store(APP_NAME, None, cfg).context("Failed to store app config")?;
    Ok(())
}

/// Load from an explicit file, creating it with defaults when missing.
pub fn load_from(path: &Path) -> Result<AppConfig> {
    let cfg: AppConfig = confy::load_path(path)
        .with_context(|| format!("Failed to load app config from {}", path.display()))?;
    Ok(cfg)
}

pub fn store_to(path: &Path, cfg: &AppConfig) -> Result<()> {
    confy::store_path(path, cfg)
        .with_context(|| format!("Failed to store app config to {}", path.display()))?;
    Ok(())
}

/// Store a secret in the OS keychain
pub fn store_secret(key: &str, value: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    entry.set_password(value)?;
    Ok(())
}

/// Retrieve a secret from the OS keychain
pub fn get_secret(key: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    let password = entry.get_password()?;
    Ok(password)
}

/// Delete a secret from the OS keychain
pub fn delete_secret(key: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    entry.delete_password()?;
    Ok(())
}

/// Merchant pin from the environment, falling back to the keychain.
pub fn resolve_merchant_id() -> Result<String> {
    if let Ok(pin) = std::env::var(MERCHANT_ENV_VAR) {
        if !pin.trim().is_empty() {
            return Ok(pin);
        }
    }
    get_secret(MERCHANT_SECRET_KEY).map_err(|e| {
        tracing::debug!(error = %e, "merchant pin not in keychain");
        anyhow!("Paystar merchant id not found in {MERCHANT_ENV_VAR} or keychain")
    })
}
