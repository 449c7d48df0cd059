//! Tic-tac-toe Web API
//!
//! Serves one live game over HTTP so a browser front end can play against
//! the minimax engine. See `api.rs` for the routes.

mod api;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tictactoe_core::{Game, Mode, Side};

use crate::api::AppStateInner;

#[derive(Parser, Debug)]
#[command(name = "tictactoe-api", about = "Play tic-tac-toe against a perfect opponent over HTTP")]
struct Config {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Pause before the computer answers, in milliseconds (0 answers in the
    /// same request)
    #[arg(long, default_value_t = 300)]
    computer_delay_ms: u64,

    /// Starting mode: pvp or pvc
    #[arg(long, default_value = "pvc")]
    mode: Mode,

    /// Side the human starts with: X or O
    #[arg(long, default_value = "X")]
    human_side: Side,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    info!(?config, "starting");

    let state = AppStateInner::new(
        Game::new(config.mode, config.human_side),
        Duration::from_millis(config.computer_delay_ms),
    );
    let app = api::router(state);

    let addr = (config.host.as_str(), config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}:{}", config.host, config.port))?;
    info!("Tic-tac-toe API running on http://{}:{}", config.host, config.port);

    axum::serve(listener, app).await?;
    Ok(())
}
