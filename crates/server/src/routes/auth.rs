//! OAuth install flow route handlers.
//!
//! - Install: redirects the merchant to Shopify's OAuth consent page
//! - Callback: verifies the HMAC, exchanges the code for an access token,
//!   and upserts it into the credential store

use axum::extract::{Query, RawQuery, State};
use axum::response::Redirect;
use serde::Deserialize;

use codrelay_core::ShopDomain;

use crate::error::AppError;
use crate::shopify::oauth;
use crate::state::AppState;

/// Query parameters for the install entry point.
#[derive(Debug, Deserialize)]
pub struct InstallQuery {
    /// Shop domain requesting installation.
    pub shop: Option<String>,
}

/// Query parameters from the Shopify OAuth callback.
///
/// The HMAC is verified over the raw query string, so only the fields the
/// handler consumes directly are modeled here.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Shop the authorization belongs to.
    pub shop: Option<String>,
    /// Authorization code to exchange for a token.
    pub code: Option<String>,
}

/// Begin the app install flow.
///
/// # Route
///
/// `GET /auth?shop=my-store.myshopify.com`
pub async fn install(
    State(state): State<AppState>,
    Query(query): Query<InstallQuery>,
) -> Result<Redirect, AppError> {
    let Some(shop) = query.shop else {
        return Err(AppError::BadRequest("Shop query param missing".to_string()));
    };

    let shop = ShopDomain::parse(&shop)
        .map_err(|e| AppError::BadRequest(format!("Invalid shop domain: {e}")))?;

    let oauth_state = oauth::generate_state();
    let url = oauth::install_url(&state.config().shopify, &shop, &oauth_state);

    Ok(Redirect::to(&url))
}

/// Handle the OAuth callback.
///
/// Verifies the callback HMAC (which covers every query parameter),
/// exchanges the authorization code, and stores the shop's access token.
///
/// # Route
///
/// `GET /auth/callback?shop=...&code=...&hmac=...`
pub async fn callback(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
    Query(query): Query<CallbackQuery>,
) -> Result<&'static str, AppError> {
    let (Some(shop), Some(code)) = (query.shop, query.code) else {
        return Err(AppError::BadRequest(
            "Missing required parameters".to_string(),
        ));
    };

    let shop = ShopDomain::parse(&shop)
        .map_err(|e| AppError::BadRequest(format!("Invalid shop domain: {e}")))?;

    oauth::verify_callback_hmac(
        &state.config().shopify.api_secret,
        raw_query.as_deref().unwrap_or_default(),
    )?;

    let token = oauth::exchange_code(
        state.http(),
        state.upstream(),
        &state.config().shopify,
        &shop,
        &code,
    )
    .await?;

    state.store().put(&shop, &token).await?;

    tracing::info!(shop = %shop, "app installed");

    Ok("App successfully installed!")
}
