//! Stdio JSON-RPC server exposing the backend tools.
//!
//! stdout carries protocol messages only, so logs go to stderr.

use ohip_agent::{build_registry, config::Config, mcp};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ohip_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    let registry = build_registry(&config)?;
    tracing::info!("Serving {} tools over stdio", registry.list().len());

    mcp::run_stdio(&registry).await
}
