use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use picochan_api::{AppState, AppStateInner, Config};
use picochan_gateway::Dispatcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "picochan=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!(
        "Log capacity {} per channel, cooldown {}s, daily hash rotation {}",
        config.max_msgs,
        config.post_cooldown,
        if config.hash_rotate_daily { "on" } else { "off" }
    );
    if config.secret_salt == picochan_api::config::DEFAULT_SALT {
        warn!("PICOCHAN_SECRET_SALT is unset; pseudonyms use the built-in salt");
    }

    // Shared state
    let state: AppState = Arc::new(AppStateInner::new(config));
    let dispatcher = state.dispatcher.clone();

    let app = picochan_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Pico-chan listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(dispatcher))
    .await?;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM, after telling every open stream to close so
/// the server can drain.
async fn shutdown_signal(dispatcher: Dispatcher) {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Cannot listen for SIGTERM ({}), Ctrl+C only", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }

    dispatcher.shutdown();
}
