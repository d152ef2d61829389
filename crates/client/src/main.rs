//! Card battle client binary.
//!
//! # Architecture
//!
//! This binary is the composition root that assembles:
//! 1. Ledger and wallet - an in-process devnet ledger
//! 2. Runtime (sync core) via RuntimeBuilder
//! 3. Frontend (UI) - CLI, GUI, etc.
//!
//! # Examples
//!
//! ```bash
//! PLAYER_ADDRESS=0x00000000000000000000000000000000000000aa \
//!     cargo run -p battle-client
//! ```

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    #[cfg(feature = "frontend-cli")]
    {
        run_cli().await?;
    }

    #[cfg(not(feature = "frontend-cli"))]
    {
        compile_error!("At least one frontend feature must be enabled (frontend-cli, etc.)");
    }

    Ok(())
}

/// Default local identity when `PLAYER_ADDRESS` is unset.
#[cfg(feature = "frontend-cli")]
const DEFAULT_PLAYER: &str = "0x00000000000000000000000000000000000000aa";

/// Run the CLI frontend against the local ledger.
#[cfg(feature = "frontend-cli")]
async fn run_cli() -> Result<()> {
    use std::sync::Arc;

    use battle_client::Client;
    use client_blockchain_core::Address;
    use client_blockchain_local::{LocalLedger, LocalWallet};
    use client_frontend_cli::{CliConfig, CliFrontend, FrontendConfig, logging};
    use runtime::{Runtime, RuntimeConfig};

    // 1. Load configuration from environment
    let runtime_config = RuntimeConfig::from_env();
    let frontend_config = FrontendConfig::from_env();
    let cli_config = CliConfig::from_env();
    let player = std::env::var("PLAYER_ADDRESS").unwrap_or_else(|_| DEFAULT_PLAYER.to_string());
    let session_id = std::env::var("SESSION_ID").ok();

    // 2. Setup logging
    let _log_guard = logging::setup_logging(session_id.as_deref())?;

    tracing::info!("Starting card battle client");
    tracing::info!(%player, chain = runtime_config.network.chain_id, "local identity");

    // 3. Ledger and wallet
    let ledger = LocalLedger::new();
    let wallet = Arc::new(LocalWallet::connected(ledger, Address::new(player)));

    // 4. Build Runtime (independent layer)
    tracing::debug!("Building runtime...");
    let runtime = Runtime::builder()
        .config(runtime_config)
        .wallet(wallet)
        .build()
        .await?;

    tracing::info!("Runtime built successfully");

    // 5. Build Frontend (independent layer)
    let frontend = CliFrontend::new(frontend_config, cli_config);

    // 6. Build and run
    let client = Client::builder()
        .runtime(runtime)
        .frontend(frontend)
        .build()?;

    tracing::info!("Client assembled, starting...");
    client.run().await?;

    tracing::info!("Client shutdown complete");
    Ok(())
}
