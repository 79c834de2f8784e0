//! hush-server: anonymous survey HTTP service.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use hush_db::SqliteStore;
use hush_server::{keystore, AppState, HushConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = HushConfig::load()?;

    // 2. Initialize tracing
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in config.logging.directives() {
        filter = filter.add_directive(directive.parse()?);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("hush server starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory {}", data_dir.display()))?;

    // 3. Open database
    let db_path = config.database_path();
    let store = SqliteStore::new(hush_db::open(&db_path)?);
    info!(path = %db_path.display(), "database ready");

    // 4. Secret protector
    let protector = Arc::new(keystore::load_protector(&config)?);

    if config.auth.api_key.is_empty() {
        warn!("no API key configured: admin routes are open");
    }

    // 5. Build app
    let bind = config.bind_addr()?;
    let state = AppState::with_sqlite(store, protector, config);
    let app = hush_server::app(state);

    // 6. Serve until Ctrl-C
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!(%bind, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("shutdown signal received"),
            Err(e) => {
                warn!(error = %e, "cannot listen for ctrl-c; running until killed");
                std::future::pending::<()>().await;
            }
        }
    })
    .await?;

    info!("server stopped");
    Ok(())
}
