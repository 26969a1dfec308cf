use pmx_hub::{
    build_router,
    config::{load_config, Config},
    ensure_seeded,
    logging::init_logging,
    AppState,
};
use pmx_storage::SqliteItemStore;
use std::net::SocketAddr;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = load_config();
    let log_guard = init_logging(&config);
    if let Some(path) = log_guard.as_ref().and_then(|guard| guard.path()) {
        info!(event = "log_file", path = %path.display());
    }
    if let Err(err) = run(&config).await {
        error!(event = "hub_error", error = %err);
        std::process::exit(1);
    }
}

async fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = match config.addr.parse() {
        Ok(value) => value,
        Err(err) => {
            error!(event = "invalid_addr", error = %err, addr = %config.addr);
            return Err(err.into());
        }
    };
    if !addr.ip().is_loopback() {
        warn!(event = "non_loopback_bind", addr = %config.addr);
    }

    let store = match SqliteItemStore::open(&config.db_path) {
        Ok(store) => store,
        Err(err) => {
            error!(event = "store_open_failed", error = %err, db = %config.db_path.display());
            return Err(err.into());
        }
    };
    if config.seed {
        ensure_seeded(&store);
    }

    let app = build_router(AppState::new(store));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        event = "hub_start",
        addr = %config.addr,
        db = %config.db_path.display()
    );

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        info!(event = "hub_shutdown");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
