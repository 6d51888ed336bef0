//! `PostgreSQL`-backed credential store.

use async_trait::async_trait;
use sqlx::PgPool;

use codrelay_core::ShopDomain;

use super::{CredentialStore, StoreError};

/// Credential store persisted in the `shop_credentials` table.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Create a new store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn get(&self, shop: &ShopDomain) -> Result<Option<String>, StoreError> {
        let token = sqlx::query_scalar::<_, String>(
            "SELECT access_token FROM shop_credentials WHERE shop = $1",
        )
        .bind(shop.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(token)
    }

    async fn put(&self, shop: &ShopDomain, access_token: &str) -> Result<(), StoreError> {
        sqlx::query(
            r"
            INSERT INTO shop_credentials (shop, access_token)
            VALUES ($1, $2)
            ON CONFLICT (shop) DO UPDATE
            SET access_token = EXCLUDED.access_token,
                updated_at = NOW()
            ",
        )
        .bind(shop.as_str())
        .bind(access_token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
