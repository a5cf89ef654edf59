//! Bearer API-key repository.
//!
//! Authentication is a collaborator, not a feature: a key resolves a
//! request to an opaque `user_id` and nothing more. Keys are generated
//! with the `rc_key_` prefix so malformed tokens can be rejected before
//! the database is consulted.

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use recall_core::{ApiKey, ApiKeyRepository, IssuedApiKey, Result};

/// Prefix identifying recall API keys.
pub const API_KEY_PREFIX: &str = "rc_key_";

/// Random characters following the prefix.
const API_KEY_RANDOM_LEN: usize = 32;

/// PostgreSQL implementation of [`ApiKeyRepository`].
pub struct PgApiKeyRepository {
    pool: Pool<Postgres>,
}

impl PgApiKeyRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn generate_token() -> String {
        let random: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(API_KEY_RANDOM_LEN)
            .map(char::from)
            .collect();
        format!("{API_KEY_PREFIX}{random}")
    }
}

#[async_trait]
impl ApiKeyRepository for PgApiKeyRepository {
    async fn validate_key(&self, token: &str) -> Result<Option<ApiKey>> {
        if !token.starts_with(API_KEY_PREFIX) {
            return Ok(None);
        }

        let row = sqlx::query(
            "SELECT id, user_id, label, created_at_utc FROM api_key WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(ApiKey {
                id: row.try_get("id")?,
                user_id: row.try_get("user_id")?,
                label: row.try_get("label")?,
                created_at_utc: row.try_get("created_at_utc")?,
            })),
            None => Ok(None),
        }
    }

    async fn create_key(&self, user_id: Uuid, label: &str) -> Result<IssuedApiKey> {
        let token = Self::generate_token();
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO api_key (user_id, token, label) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(user_id)
        .bind(&token)
        .bind(label)
        .fetch_one(&self.pool)
        .await?;

        Ok(IssuedApiKey {
            id,
            user_id,
            label: label.to_string(),
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_prefixed_and_unique() {
        let a = PgApiKeyRepository::generate_token();
        let b = PgApiKeyRepository::generate_token();
        assert!(a.starts_with(API_KEY_PREFIX));
        assert_eq!(a.len(), API_KEY_PREFIX.len() + API_KEY_RANDOM_LEN);
        assert_ne!(a, b);
    }
}
