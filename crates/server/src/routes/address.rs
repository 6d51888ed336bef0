//! Address autocomplete route handler.

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

/// Minimum query length forwarded to the geocoder.
const MIN_QUERY_LENGTH: usize = 3;

/// Query parameters for the suggestions endpoint.
#[derive(Debug, Deserialize)]
pub struct AddressQuery {
    /// Free-text address fragment.
    pub q: Option<String>,
}

/// Forward an autocomplete query to the geocoder.
///
/// # Route
///
/// `GET /api/address?q=delhi`
pub async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let q = query.q.unwrap_or_default();
    let q = q.trim();

    if q.len() < MIN_QUERY_LENGTH {
        return Err(AppError::BadRequest(
            "Query must be at least 3 characters long.".to_string(),
        ));
    }

    let Some(geocoder) = state.geocoder() else {
        return Err(AppError::Unavailable(
            "address autocomplete is not configured",
        ));
    };

    let suggestions = geocoder.autocomplete(q).await?;

    Ok(Json(json!({ "success": true, "suggestions": suggestions })))
}
