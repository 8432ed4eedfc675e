use anyhow::Result;
use farmstand_api::{app_router, config, db, AppState};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = config::load_config()?;
    config::init_tracing(&cfg.log_level, cfg.log_json);

    let connection = db::establish_connection_from_app_config(&cfg).await?;
    let connection = Arc::new(connection);

    if cfg.auto_migrate {
        db::run_migrations(&connection).await?;
    }
    db::check_connection(&connection).await?;

    let state = Arc::new(AppState::new(connection, cfg.clone()));
    let app = app_router(state);

    let addr = cfg.bind_address();
    info!("farmstand-api listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
