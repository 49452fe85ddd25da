use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use chess_coach_core::{ChatClient, Coach, Config, EngineManager, Game, Session};

mod routes;

#[tokio::main]
async fn main() {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> chess_coach_core::Result<()> {
    let config = Config::from_env()?;

    let game = match config.start_fen.as_deref() {
        Some(fen) => Game::from_fen(fen)?,
        None => Game::new(),
    };

    let engine = Arc::new(EngineManager::new(config.engine.clone()));
    let generator = Arc::new(ChatClient::new(config.generator.clone())?);
    let coach = Coach::new(engine, generator, config.generator.timeout);
    let session = Arc::new(Session::new(game, coach));

    let app = routes::router(Arc::clone(&session));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        engine = %config.engine.path,
        model = %config.generator.model,
        "Chess coach running at http://{}",
        addr
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    // The engine process is released on every normal exit path
    session.shutdown().await;

    if let Err(e) = served {
        tracing::error!("server error: {}", e);
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutting down");
}
