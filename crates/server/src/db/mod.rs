//! Credential storage for per-shop access tokens.
//!
//! # Schema
//!
//! A single table, `shop_credentials`, maps a shop domain to its current
//! Admin API access token. Rows are upserted on every successful OAuth
//! install and never deleted in-band.
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/` and run automatically at
//! startup via [`run_migrations`].

pub mod shops;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::sync::RwLock;

use codrelay_core::ShopDomain;

pub use shops::PgCredentialStore;

/// Errors that can occur during credential store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run pending migrations against the pool.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails to apply.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Store of per-shop access credentials.
///
/// `get` returning `None` is a normal, expected condition (the shop never
/// installed the app, or revoked it) and is mapped by callers to an
/// authorization failure - it is never an error here.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the access token for a shop.
    async fn get(&self, shop: &ShopDomain) -> Result<Option<String>, StoreError>;

    /// Upsert the access token for a shop. Last write wins.
    async fn put(&self, shop: &ShopDomain, access_token: &str) -> Result<(), StoreError>;
}

/// In-process credential store backing `COD_CREDENTIAL_STORE=memory`.
///
/// Tokens are lost on restart; local runs and tests only.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, shop: &ShopDomain) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(shop.as_str()).cloned())
    }

    async fn put(&self, shop: &ShopDomain, access_token: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert(shop.as_str().to_owned(), access_token.to_owned());
        Ok(())
    }
}
