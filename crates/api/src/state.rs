use std::sync::Arc;

use async_trait::async_trait;
use chatline_auth::{AccountService, Authenticator};
use chatline_cache::RedisSessionCache;
use chatline_chat::{ChatService, MessageService};
use chatline_db::DbPool;

/// Reachability of the backing services, reported by `GET /health`.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn database_healthy(&self) -> bool;
    async fn cache_healthy(&self) -> bool;
}

/// [`HealthCheck`] over the production PostgreSQL pool and Redis cache.
pub struct BackendHealth {
    pub pool: DbPool,
    pub cache: RedisSessionCache,
}

#[async_trait]
impl HealthCheck for BackendHealth {
    async fn database_healthy(&self) -> bool {
        chatline_db::health_check(&self.pool).await.is_ok()
    }

    async fn cache_healthy(&self) -> bool {
        self.cache.health_check().await.is_ok()
    }
}

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Login, authorize, refresh and logout.
    pub auth: Arc<dyn Authenticator>,
    pub accounts: AccountService,
    pub chats: ChatService,
    pub messages: MessageService,
    pub health: Arc<dyn HealthCheck>,
}
