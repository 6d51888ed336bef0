//! Shopify app OAuth install flow.
//!
//! Handles the three pieces of the install handshake:
//! - Authorization URL generation with a random `state` parameter
//! - Callback HMAC verification (HMAC-SHA256 over the sorted query string,
//!   per Shopify's app verification scheme)
//! - Exchanging the authorization code for a shop access token

use hmac::{Hmac, Mac};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;
use tracing::instrument;

use codrelay_core::ShopDomain;

use crate::config::ShopifyAppConfig;

use super::UpstreamConfig;

/// Errors that can occur during the OAuth flow.
#[derive(Debug, Error)]
pub enum OauthError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The token exchange endpoint rejected the code.
    #[error("token exchange failed with status {status}: {body}")]
    Exchange {
        /// HTTP status code.
        status: u16,
        /// Response body, surfaced for diagnostics.
        body: String,
    },

    /// The callback query's HMAC did not verify.
    #[error("callback signature mismatch")]
    InvalidHmac,
}

/// Generate a random `state` parameter for the authorization URL.
#[must_use]
pub fn generate_state() -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    const STATE_LENGTH: usize = 32;

    let mut rng = rand::rng();
    (0..STATE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            // SAFETY: idx is always within bounds since random_range returns 0..CHARSET.len()
            char::from(*CHARSET.get(idx).expect("idx within bounds"))
        })
        .collect()
}

/// Build the authorization URL the merchant is redirected to at install.
#[must_use]
pub fn install_url(config: &ShopifyAppConfig, shop: &ShopDomain, state: &str) -> String {
    format!(
        "https://{shop}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}",
        urlencoding::encode(&config.api_key),
        urlencoding::encode(&config.scopes),
        urlencoding::encode(&config.redirect_uri),
        urlencoding::encode(state)
    )
}

/// Verify the `hmac` parameter on an OAuth callback query string.
///
/// The signature covers every other query parameter, sorted by key and
/// re-joined as `key=value&...`, HMAC-SHA256ed with the app secret.
///
/// # Errors
///
/// Returns `OauthError::InvalidHmac` when the parameter is missing or the
/// signature does not match.
#[instrument(skip_all)]
pub fn verify_callback_hmac(secret: &SecretString, raw_query: &str) -> Result<(), OauthError> {
    let mut signature = None;
    let mut pairs: Vec<(String, String)> = Vec::new();

    for (key, value) in url::form_urlencoded::parse(raw_query.as_bytes()) {
        if key == "hmac" {
            signature = Some(value.into_owned());
        } else {
            pairs.push((key.into_owned(), value.into_owned()));
        }
    }

    let Some(signature) = signature else {
        return Err(OauthError::InvalidHmac);
    };

    pairs.sort();
    let message = pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|_| OauthError::InvalidHmac)?;
    mac.update(message.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !constant_time_compare(&expected, &signature) {
        return Err(OauthError::InvalidHmac);
    }

    Ok(())
}

/// Exchange an authorization code for a shop access token.
///
/// # Errors
///
/// Returns `OauthError::Exchange` when the endpoint rejects the code, and
/// `OauthError::Http` on transport failures.
#[instrument(skip(client, upstream, config, code), fields(shop = %shop))]
pub async fn exchange_code(
    client: &reqwest::Client,
    upstream: &UpstreamConfig,
    config: &ShopifyAppConfig,
    shop: &ShopDomain,
    code: &str,
) -> Result<String, OauthError> {
    #[derive(serde::Deserialize)]
    struct AccessTokenResponse {
        access_token: String,
    }

    let url = format!("{}/admin/oauth/access_token", upstream.base_url(shop));

    let params = [
        ("client_id", config.api_key.as_str()),
        ("client_secret", config.api_secret.expose_secret()),
        ("code", code),
    ];

    let response = client.post(&url).form(&params).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(OauthError::Exchange {
            status: status.as_u16(),
            body,
        });
    }

    let token: AccessTokenResponse = response.json().await?;

    Ok(token.access_token)
}

/// Constant-time string comparison to prevent timing attacks.
pub(crate) fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> ShopifyAppConfig {
        ShopifyAppConfig {
            api_key: "test_client_id".to_string(),
            api_secret: SecretString::from("shpss_9f8e7d6c5b4a3210"),
            scopes: "write_orders,write_draft_orders".to_string(),
            redirect_uri: "https://app.test/auth/callback".to_string(),
            api_version: "2024-04".to_string(),
            api_base: None,
        }
    }

    fn sign(secret: &str, message: &str) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("hello", "hello"));
        assert!(constant_time_compare("", ""));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("hello", "world"));
        assert!(!constant_time_compare("hello", "hell"));
        assert!(!constant_time_compare("hello", "helloo"));
    }

    #[test]
    fn test_generate_state_length_and_charset() {
        let state = generate_state();
        assert_eq!(state.len(), 32);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_install_url_contains_oauth_params() {
        let config = test_config();
        let shop = ShopDomain::parse("my-store.myshopify.com").unwrap();
        let url = install_url(&config, &shop, "abc123");

        assert!(url.starts_with("https://my-store.myshopify.com/admin/oauth/authorize?"));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("scope=write_orders%2Cwrite_draft_orders"));
    }

    #[test]
    fn test_verify_hmac_valid_signature() {
        let secret = SecretString::from("shpss_9f8e7d6c5b4a3210");

        // Signature covers the sorted non-hmac params.
        let signature = sign(
            "shpss_9f8e7d6c5b4a3210",
            "code=authcode&shop=my-store.myshopify.com&state=abc&timestamp=1700000000",
        );
        let raw_query = format!(
            "shop=my-store.myshopify.com&code=authcode&timestamp=1700000000&state=abc&hmac={signature}"
        );

        assert!(verify_callback_hmac(&secret, &raw_query).is_ok());
    }

    #[test]
    fn test_verify_hmac_rejects_tampered_query() {
        let secret = SecretString::from("shpss_9f8e7d6c5b4a3210");

        let signature = sign(
            "shpss_9f8e7d6c5b4a3210",
            "code=authcode&shop=my-store.myshopify.com",
        );
        let raw_query = format!("shop=evil.myshopify.com&code=authcode&hmac={signature}");

        assert!(matches!(
            verify_callback_hmac(&secret, &raw_query),
            Err(OauthError::InvalidHmac)
        ));
    }

    #[test]
    fn test_verify_hmac_rejects_missing_hmac() {
        let secret = SecretString::from("shpss_9f8e7d6c5b4a3210");
        assert!(matches!(
            verify_callback_hmac(&secret, "shop=my-store.myshopify.com&code=authcode"),
            Err(OauthError::InvalidHmac)
        ));
    }

    #[test]
    fn test_verify_hmac_rejects_wrong_secret() {
        let secret = SecretString::from("shpss_9f8e7d6c5b4a3210");

        let signature = sign("some-other-secret", "code=authcode&shop=my-store.myshopify.com");
        let raw_query = format!("shop=my-store.myshopify.com&code=authcode&hmac={signature}");

        assert!(matches!(
            verify_callback_hmac(&secret, &raw_query),
            Err(OauthError::InvalidHmac)
        ));
    }
}
