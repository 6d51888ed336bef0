//! Shopify Admin API client and OAuth helpers.
//!
//! # Architecture
//!
//! - [`ShopifyClient`] carries a shop-scoped access token and speaks both
//!   the Admin REST API (draft orders, orders) and the GraphQL API
//!   (customer lookup, `orderCreate`)
//! - [`oauth`] implements the app install flow: authorization URL,
//!   callback HMAC verification, and the code-for-token exchange
//! - The per-shop base URL is injected via [`UpstreamConfig`] rather than
//!   interpolated at call sites, so tests can point the client at a local
//!   mock server

mod client;
pub mod oauth;
pub mod types;

pub use client::ShopifyClient;

use thiserror::Error;

use codrelay_core::ShopDomain;

use crate::config::ShopifyAppConfig;

/// Connection parameters for the Admin API, injected into every client.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Admin API version segment (e.g., 2024-04)
    pub api_version: String,
    /// Override for the per-shop `https://{shop}` base URL
    pub api_base: Option<String>,
}

impl UpstreamConfig {
    /// Build upstream parameters from the app configuration.
    #[must_use]
    pub fn from_app(config: &ShopifyAppConfig) -> Self {
        Self {
            api_version: config.api_version.clone(),
            api_base: config.api_base.clone(),
        }
    }

    /// Base URL for a shop: the configured override, or `https://{shop}`.
    #[must_use]
    pub fn base_url(&self, shop: &ShopDomain) -> String {
        self.api_base
            .clone()
            .unwrap_or_else(|| format!("https://{shop}"))
    }
}

/// Errors that can occur when calling the Shopify Admin API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed (transport or decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the Admin API.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, surfaced for diagnostics.
        body: String,
    },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", messages.join("; "))]
    GraphQL {
        /// Error messages from the `errors` array.
        messages: Vec<String>,
    },

    /// User error from a mutation (e.g., invalid input).
    #[error("user error: {0}")]
    UserError(String),

    /// JSON extraction from a GraphQL payload failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ShopifyError::Status {
            status: 422,
            body: "{\"errors\":\"already completed\"}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "unexpected status 422: {\"errors\":\"already completed\"}"
        );
    }

    #[test]
    fn test_graphql_error_display_joins_messages() {
        let err = ShopifyError::GraphQL {
            messages: vec!["Field not found".to_string(), "Invalid ID".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID"
        );
    }

    #[test]
    fn test_base_url_defaults_to_shop_domain() {
        let upstream = UpstreamConfig {
            api_version: "2024-04".to_string(),
            api_base: None,
        };
        let shop = ShopDomain::parse("my-store.myshopify.com").unwrap();
        assert_eq!(
            upstream.base_url(&shop),
            "https://my-store.myshopify.com"
        );
    }

    #[test]
    fn test_base_url_honors_override() {
        let upstream = UpstreamConfig {
            api_version: "2024-04".to_string(),
            api_base: Some("http://127.0.0.1:9100".to_string()),
        };
        let shop = ShopDomain::parse("my-store.myshopify.com").unwrap();
        assert_eq!(upstream.base_url(&shop), "http://127.0.0.1:9100");
    }
}
