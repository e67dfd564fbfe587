//! Shared application state handed to every worker.

use actix_web::web;
use std::sync::Arc;

use crate::auth::{AuthService, BcryptVerifier, TokenCodec};
use crate::config::AuthConfig;
use crate::store::{MemoryTaskStore, MemoryUserStore, TaskStore, UserStore};

/// Handles registered as app data: the auth service for the `/auth` handlers, the token codec
/// for `AuthMiddleware`, and the task store for the `/tasks` handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: web::Data<AuthService>,
    pub codec: web::Data<TokenCodec>,
    pub tasks: web::Data<dyn TaskStore>,
}

impl AppState {
    pub fn new(users: Arc<dyn UserStore>, tasks: Arc<dyn TaskStore>, config: &AuthConfig) -> Self {
        let codec = Arc::new(TokenCodec::new(config));
        let auth = AuthService::new(
            users,
            codec.clone(),
            Arc::new(BcryptVerifier::new(config.bcrypt_cost)),
        );

        Self {
            auth: web::Data::new(auth),
            codec: web::Data::from(codec),
            tasks: web::Data::from(tasks),
        }
    }

    /// State backed by process memory. Nothing survives a restart.
    pub fn in_memory(config: &AuthConfig) -> Self {
        Self::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryTaskStore::new()),
            config,
        )
    }

    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.auth.clone())
            .app_data(self.codec.clone())
            .app_data(self.tasks.clone());
    }
}
