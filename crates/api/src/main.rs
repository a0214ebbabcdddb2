use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chatline_api::config::ServerConfig;
use chatline_api::router::build_app_router;
use chatline_api::state::{AppState, BackendHealth};
use chatline_auth::{AccountService, AuthComponents, AuthService};
use chatline_cache::RedisSessionCache;
use chatline_chat::{ChatService, MessageService};
use chatline_core::hashing::Sha256TokenHasher;
use chatline_db::{
    PgAccountStore, PgChatStore, PgLoginHistoryStore, PgMessageStore, PgSessionStore,
    PgTransactionCoordinator,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatline_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = chatline_db::create_pool(&database_url, config.database_max_connections)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    chatline_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    chatline_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Cache ---
    let cache = RedisSessionCache::connect(&config.redis_url)
        .await
        .expect("Failed to connect to Redis");

    // --- Services ---
    let account_store = Arc::new(PgAccountStore::new(pool.clone()));
    let chat_store = Arc::new(PgChatStore::new(pool.clone()));
    let accounts = AccountService::new(account_store.clone(), config.auth.password_min_length);
    let chats = ChatService::new(chat_store.clone(), account_store);
    let messages = MessageService::new(Arc::new(PgMessageStore::new(pool.clone())), chat_store);
    let components = AuthComponents {
        coordinator: PgTransactionCoordinator::new(pool.clone()),
        sessions: PgSessionStore::new(pool.clone()),
        history: PgLoginHistoryStore::new(pool.clone()),
        cache: Arc::new(cache.clone()),
        verifier: Arc::new(accounts.clone()),
        issuer: Arc::new(config.auth.token_issuer()),
        hasher: Arc::new(Sha256TokenHasher),
    };
    let auth = AuthService::new(components, config.auth.clone());

    // --- App state ---
    let state = AppState {
        auth: Arc::new(auth),
        accounts,
        chats,
        messages,
        health: Arc::new(BackendHealth { pool, cache }),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
    .await
    .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM, then arm a hard deadline for in-flight
/// requests to drain.
async fn shutdown_signal(drain_timeout: Duration) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }

    tokio::spawn(async move {
        tokio::time::sleep(drain_timeout).await;
        tracing::warn!(
            timeout_secs = drain_timeout.as_secs(),
            "Shutdown drain timed out, exiting"
        );
        std::process::exit(1);
    });
}
