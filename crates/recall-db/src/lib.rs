//! # recall-db
//!
//! PostgreSQL database layer for recall.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for highlights, review sessions, the
//!   review-event log, and API keys
//!
//! ## Example
//!
//! ```rust,ignore
//! use recall_db::Database;
//! use recall_core::{CreateHighlightRequest, HighlightRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/recall").await?;
//!
//!     let highlight = db.highlights.insert(user_id, CreateHighlightRequest {
//!         document_id: None,
//!         content: "Spacing effect: distributed practice beats massing".into(),
//!         note: None,
//!         color: None,
//!     }).await?;
//!
//!     println!("Created highlight: {}", highlight.id);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod events;
pub mod highlights;
pub mod pool;
pub mod sessions;

// Re-export core types
pub use recall_core::*;

// Re-export repository implementations
pub use auth::{PgApiKeyRepository, API_KEY_PREFIX};
pub use events::PgReviewEventRepository;
pub use highlights::PgHighlightRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use sessions::PgReviewSessionRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Highlight repository, including due-card selection.
    pub highlights: PgHighlightRepository,
    /// Review session repository.
    pub sessions: PgReviewSessionRepository,
    /// Append-only review-event log.
    pub events: PgReviewEventRepository,
    /// Bearer API keys.
    pub api_keys: PgApiKeyRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            highlights: PgHighlightRepository::new(pool.clone()),
            sessions: PgReviewSessionRepository::new(pool.clone()),
            events: PgReviewEventRepository::new(pool.clone()),
            api_keys: PgApiKeyRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
