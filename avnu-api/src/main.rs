//! avnu-api binary - venue marketplace core service

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};

use avnu_api::{build_router, AppState};
use avnu_common::config::AvnuConfig;
use avnu_common::events::EventBus;

#[derive(Parser, Debug)]
#[command(name = "avnu-api", about = "Avnu venue marketplace core service")]
struct Args {
    /// Root folder holding the database (overrides AVNU_ROOT and the config
    /// file)
    #[arg(long)]
    root_folder: Option<String>,

    /// Bind address override (host:port)
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting Avnu marketplace API v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let mut config = AvnuConfig::load(args.root_folder.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_address = bind;
    }
    config.ensure_root_folder()?;

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match avnu_common::db::init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let bus = EventBus::new(config.event_capacity);
    let state = AppState::new(
        pool,
        bus,
        config.notify_retry,
        &config.functions_base_url,
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("avnu-api listening on http://{}", config.bind_address);
    info!("Health check: http://{}/health", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
