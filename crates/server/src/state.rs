//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::cod::CodOrderService;
use crate::config::AppConfig;
use crate::db::CredentialStore;
use crate::services::geocoder::GeocoderClient;
use crate::shopify::UpstreamConfig;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the credential store and outbound clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    pool: Option<PgPool>,
    store: Arc<dyn CredentialStore>,
    upstream: UpstreamConfig,
    cod: CodOrderService,
    geocoder: Option<GeocoderClient>,
    http: reqwest::Client,
}

impl AppState {
    /// Create a new application state.
    ///
    /// `pool` is `None` when running with the in-memory credential store.
    #[must_use]
    pub fn new(config: AppConfig, pool: Option<PgPool>, store: Arc<dyn CredentialStore>) -> Self {
        let http = reqwest::Client::new();
        let upstream = UpstreamConfig::from_app(&config.shopify);

        let geocoder = config
            .geocoder
            .as_ref()
            .map(|geocoder| GeocoderClient::new(geocoder, http.clone()));

        let cod = CodOrderService::new(
            Arc::clone(&store),
            http.clone(),
            upstream.clone(),
            config.cod.clone(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                store,
                upstream,
                cod,
                geocoder,
                http,
            }),
        }
    }

    /// Get a reference to the application configuration.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    /// Get the database pool, if one is configured.
    #[must_use]
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    /// Get a reference to the credential store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// Get the injected Admin API connection parameters.
    #[must_use]
    pub fn upstream(&self) -> &UpstreamConfig {
        &self.inner.upstream
    }

    /// Get a reference to the COD order service.
    #[must_use]
    pub fn cod(&self) -> &CodOrderService {
        &self.inner.cod
    }

    /// Get the geocoder client, if address autocomplete is configured.
    #[must_use]
    pub fn geocoder(&self) -> Option<&GeocoderClient> {
        self.inner.geocoder.as_ref()
    }

    /// Get the shared outbound HTTP client.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }
}
