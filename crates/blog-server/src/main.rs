use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod config;

use config::{Config, LogFormat};

#[derive(Parser, Debug)]
#[command(name = "blog-server", about = "Blog backend HTTP server")]
struct Cli {
    /// Path to the TOML config file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override `server.bind_address`
    #[arg(long)]
    bind: Option<String>,

    /// Override `database.url`
    #[arg(long)]
    database_url: Option<String>,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config)?;
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    init_tracing(config.server.log_format);
    tracing::info!("Loaded configuration from {:?}", cli.config);

    let db = blog_db::create_pool(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to open database")?;
    blog_db::run_migrations(&db)
        .await
        .context("Failed to run database migrations")?;

    let state = blog_core::AppState::new(db, config.app_config());
    tokio::fs::create_dir_all(state.media.dir())
        .await
        .with_context(|| format!("Failed to create media directory {:?}", state.media.dir()))?;
    tracing::info!("Storing profile pictures in {:?}", state.media.dir());

    let app = blog_api::build_router(
        &config.server.allowed_origins,
        config.storage.max_upload_size,
    )
    .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_address))?;
    tracing::info!("Listening on {}", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
