//! Skirmish relay binary.
//!
//! Configuration comes from the environment (`SKIRMISH_BIND_ADDRESS`,
//! `SKIRMISH_WRITE_TIMEOUT_SECS`); log filtering from `RUST_LOG`.

use skirmish::{ServerConfig, SkirmishServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "skirmish=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(?config, "starting skirmish");

    let server = SkirmishServer::builder().config(config).build().await?;
    server.run().await?;
    Ok(())
}
