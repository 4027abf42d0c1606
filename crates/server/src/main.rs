//! Headless survival match server.
//!
//! Loads content from the data directory, starts an authoritative session,
//! connects one player replica and one server-driven bot, and plays a short
//! scripted match: loot a supply crate, trade fire, loot the loser, patch up.
//!
//! ```bash
//! RUST_LOG=runtime=debug,core=debug cargo run -p survival-server
//! ```
mod config;
mod script;

use anyhow::{Context, Result};
use survival_content::ContentFactory;
use survival_runtime::Session;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(data_dir = %config.data_dir.display(), tick = ?config.tick, "starting survival server");

    let factory = ContentFactory::new(&config.data_dir);
    let game_config = factory.load_config().context("loading game config")?;
    let catalog = factory.load_catalog().context("loading item catalog")?;

    let session = Session::builder()
        .game_config(game_config)
        .catalog(catalog)
        .build()
        .await?;

    let report = script::play(session.handle(), config.tick).await?;

    if config.print_summary {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    session.shutdown().await?;
    tracing::info!("server shutdown complete");
    Ok(())
}
