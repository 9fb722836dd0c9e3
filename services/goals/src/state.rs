//! Application state shared across handlers

use handlebars::TemplateError;
use sqlx::SqlitePool;

use crate::{
    jwt::JwtService,
    rate_limiter::RateLimiter,
    repositories::{GoalRepository, UserRepository},
    session::SessionManager,
    settings::AppConfig,
    views::Templates,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub user_repository: UserRepository,
    pub goal_repository: GoalRepository,
    pub sessions: SessionManager,
    pub login_limiter: RateLimiter,
    pub templates: Templates,
}

impl AppState {
    /// Wire repositories and services around an initialized pool
    pub fn new(pool: SqlitePool, config: &AppConfig) -> Result<Self, TemplateError> {
        let jwt_service = JwtService::new(&config.session.secret, config.session.ttl_seconds);

        Ok(Self {
            user_repository: UserRepository::new(pool.clone()),
            goal_repository: GoalRepository::new(pool.clone()),
            sessions: SessionManager::new(jwt_service),
            login_limiter: RateLimiter::new(config.login.clone()),
            templates: Templates::new()?,
            db_pool: pool,
        })
    }
}
