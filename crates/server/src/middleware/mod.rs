//! Request middleware.

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use secrecy::ExposeSecret;
use serde_json::json;

use crate::shopify::oauth::constant_time_compare;
use crate::state::AppState;

/// Shared-key check for the address endpoint.
///
/// When `ADDRESS_API_ACCESS_TOKEN` is configured, requests must present it
/// in the `x-access-token` header; otherwise the endpoint is open (the
/// server logs a warning at startup in that case).
pub async fn require_address_token(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config().address_api_token.as_ref() else {
        return next.run(req).await;
    };

    let provided = req
        .headers()
        .get("x-access-token")
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(token) if constant_time_compare(token, expected.expose_secret()) => {
            next.run(req).await
        }
        _ => (
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "message": "Unauthorized access" })),
        )
            .into_response(),
    }
}
