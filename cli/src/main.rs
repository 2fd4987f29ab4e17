mod commands;

use clap::Parser;
use config::{AppConfig, TransportKind};
use gateway::{http::ReqwestTransport, mock::MockTransport, HttpTransport};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const MOCK_MERCHANT_ID: &str = "mock-merchant";

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn create_transport(cfg: &AppConfig) -> anyhow::Result<Arc<dyn HttpTransport>> {
    match cfg.transport.kind {
        TransportKind::Http => {
            tracing::info!(timeout_secs = cfg.transport.timeout_secs, "Using Paystar over HTTP");
            let transport =
                ReqwestTransport::new(Duration::from_secs(cfg.transport.timeout_secs))?;
            Ok(transport)
        }
        TransportKind::Mock => {
            tracing::info!("Using mock transport");
            Ok(MockTransport::with_latency(Duration::from_millis(200)))
        }
    }
}

fn merchant_id(cfg: &AppConfig) -> anyhow::Result<String> {
    if cfg.is_mock() {
        return Ok(std::env::var(config::MERCHANT_ENV_VAR)
            .unwrap_or_else(|_| MOCK_MERCHANT_ID.to_string()));
    }
    config::resolve_merchant_id()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = commands::Cli::parse();
    commands::run(cli).await
}
