use anyhow::Result;
use tracing::info;

use tusker_uci::UciEngine;

fn main() -> Result<()> {
    // Logs go to stderr; stdout belongs to the UCI protocol.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("tusker starting");
    UciEngine::new().run()?;
    Ok(())
}
