use anyhow::Context;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use reciapp_api_rust::{config, database::DatabaseManager, server, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, TIMEZONE, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config::config();
    tracing::info!("Starting Reciapp API in {:?} mode", config.environment);

    let state = AppState::bootstrap(config).await?;
    let app = server::app(state, &config.api);

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Reciapp API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.exit_on_stdin_close))
        .await
        .context("server error")?;

    DatabaseManager::close_all().await;
    Ok(())
}

async fn shutdown_signal(watch_stdin: bool) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let stdin_eof = async {
        if watch_stdin {
            let _ = stdin_closed().await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("Shutdown signal received"),
        _ = stdin_eof => tracing::info!("stdin closed, shutting down"),
    }
}

// Blocking stdin reads cannot be cancelled, so the reader lives on a detached thread
fn stdin_closed() -> oneshot::Receiver<()> {
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        if let Err(e) = std::io::copy(&mut std::io::stdin().lock(), &mut std::io::sink()) {
            tracing::warn!("stdin read failed: {}", e);
        }
        let _ = tx.send(());
    });
    rx
}
