use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use community_mailer::api;
use community_mailer::auth::AuthService;
use community_mailer::config::Config;
use community_mailer::invite::InvitationDispatcher;
use community_mailer::mail::{Mailer, SendWithUsClient};
use community_mailer::redis::{create_pool, CommunityRepository};
use community_mailer::reply::ReplyAddressCodec;
use community_mailer::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting community mailer...");

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!(
        host = %config.server_host,
        port = %config.server_port,
        reply_domain = %config.reply_address_domain,
        max_in_flight = config.invite_max_in_flight,
        batch_timeout_secs = config.invite_batch_timeout.as_secs(),
        "Configuration loaded"
    );

    // Create Redis connection pool
    let redis_pool = create_pool(&config)?;
    let communities = Arc::new(CommunityRepository::new(redis_pool));

    // Test Redis connection
    match communities.health_check().await {
        Ok(true) => tracing::info!("Redis connection established"),
        Ok(false) => tracing::warn!("Redis health check returned false"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to Redis");
            // Continue anyway, might recover later
        }
    }

    let auth = AuthService::new(&config);

    let reply_codec = Arc::new(ReplyAddressCodec::from_config(&config));
    let provider = Arc::new(SendWithUsClient::new(&config));
    let mailer = Arc::new(Mailer::new(
        provider,
        reply_codec.clone(),
        &config.email_sender_name,
    ));

    let dispatcher = InvitationDispatcher::new(
        mailer.clone(),
        communities.clone(),
        config.invite_max_in_flight,
        &config.app_url,
    );

    let state = AppState::new(
        config.clone(),
        auth,
        communities,
        mailer,
        reply_codec,
        dispatcher,
    );

    // Build router
    let app = Router::new()
        .merge(api::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Server listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Handle shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down...");
        },
    }
}
