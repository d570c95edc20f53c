use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{
    jwt::JwtKeys,
    memory::InMemoryUserStore,
    repo::{PgUserStore, UserStore},
    services::AuthService,
};
use crate::config::AppConfig;
use crate::db;
use crate::rate_limit::FixedWindowLimiter;
use crate::todos::{
    memory::InMemoryTodoStore,
    repo::{PgTodoStore, TodoStore},
    services::TodoService,
};

/// Everything the user service handlers need, built once at startup.
#[derive(Clone)]
pub struct AuthState {
    pub keys: JwtKeys,
    pub auth: Arc<AuthService>,
    pub login_limiter: Arc<FixedWindowLimiter>,
}

impl AuthState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db = db::connect_with_retry(&config.database).await?;
        db::run_migrations(&db, sqlx::migrate!("./migrations/users"), "user").await?;
        Ok(Self::from_parts(config, Arc::new(PgUserStore::new(db))))
    }

    pub fn from_parts(config: &AppConfig, users: Arc<dyn UserStore>) -> Self {
        let keys = JwtKeys::new(&config.jwt);
        let login_limiter = Arc::new(FixedWindowLimiter::from_config(&config.login_rate_limit));
        Self {
            auth: Arc::new(AuthService::new(users, keys.clone())),
            keys,
            login_limiter,
        }
    }

    /// Wiring over an in-memory credential store.
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::from_parts(config, Arc::new(InMemoryUserStore::new()))
    }
}

impl FromRef<AuthState> for JwtKeys {
    fn from_ref(state: &AuthState) -> Self {
        state.keys.clone()
    }
}

/// Everything the todo service handlers need, built once at startup.
#[derive(Clone)]
pub struct TodoState {
    pub keys: JwtKeys,
    pub todos: Arc<TodoService>,
}

impl TodoState {
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db = db::connect_with_retry(&config.database).await?;
        db::run_migrations(&db, sqlx::migrate!("./migrations/todos"), "todo").await?;
        Ok(Self::from_parts(config, Arc::new(PgTodoStore::new(db))))
    }

    pub fn from_parts(config: &AppConfig, store: Arc<dyn TodoStore>) -> Self {
        Self {
            keys: JwtKeys::new(&config.jwt),
            todos: Arc::new(TodoService::new(store)),
        }
    }

    /// Wiring over an in-memory todo store.
    pub fn in_memory(config: &AppConfig) -> Self {
        Self::from_parts(config, Arc::new(InMemoryTodoStore::new()))
    }
}

impl FromRef<TodoState> for JwtKeys {
    fn from_ref(state: &TodoState) -> Self {
        state.keys.clone()
    }
}
