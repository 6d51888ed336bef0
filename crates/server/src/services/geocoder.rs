//! LocationIQ client for address autocomplete.
//!
//! A single forwarded call: the suggestion payload is passed through to
//! the caller unmodified.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;

use crate::config::GeocoderConfig;

/// Errors that can occur when querying the geocoder.
#[derive(Debug, Error)]
pub enum GeocoderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },
}

/// LocationIQ autocomplete client.
#[derive(Clone)]
pub struct GeocoderClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl std::fmt::Debug for GeocoderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeocoderClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeocoderClient {
    /// Create a new client.
    #[must_use]
    pub fn new(config: &GeocoderConfig, client: reqwest::Client) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        }
    }

    /// Fetch address suggestions for a free-text query.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API returns non-2xx.
    #[instrument(skip(self))]
    pub async fn autocomplete(&self, query: &str) -> Result<serde_json::Value, GeocoderError> {
        let url = format!("{}/autocomplete", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.expose_secret()),
                ("q", query),
                ("limit", "5"),
                ("dedupe", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeocoderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
