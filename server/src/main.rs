use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod routes;

use config::Cli;
use routes::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let state = AppState::new(
        cli.rules(),
        cli.difficulty_config(),
        cli.search_config(),
        cli.session_limits(),
    )?;
    let app = app_router(state, Some(cli.static_dir.as_path()));

    let listener = TcpListener::bind(&cli.addr).await?;
    info!(
        threads = cli.search_config().threads,
        initial_samples = cli.initial_samples,
        "Listening on http://{}",
        cli.addr
    );
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
