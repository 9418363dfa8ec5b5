//! Route table and shared application state.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::sqlite::SqlitePool;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::auth::{CredentialVerifier, StaticCredentials};
use crate::config::AppConfig;
use crate::{Result, db, views};

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl AppState {
    /// Connects to the database, creates the schema and assembles the
    /// state out of a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unreachable or the schema
    /// cannot be created.
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let pool = db::connect(&config.database_url).await?;
        db::migrate(&pool).await?;
        let verifier = Arc::new(StaticCredentials::from(&config.admin));
        Ok(Self {
            pool,
            config: Arc::new(config),
            verifier,
        })
    }
}

/// Builds the application router with its session layer.
///
/// The session store is in-memory: sessions last as long as the process,
/// which also bounds the admin flag's lifetime.
#[must_use]
pub fn build(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(state.config.secure_cookies);

    Router::new()
        .route("/", get(views::index))
        .route("/display_image/{filename}", get(views::display_image))
        .route("/game/{game_id}", get(views::game_page))
        .route("/game/{game_id}/add_comment", post(views::add_comment))
        .route("/login", get(views::login_page).post(views::login_submit))
        .route("/logout", get(views::logout))
        .route("/admin", get(views::admin_page).post(views::admin_submit))
        .layer(session_layer)
        .with_state(state)
}
