//! COD order placement route handler.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::cod::{CodOrderOutcome, OrderRequest};
use crate::error::AppError;
use crate::state::AppState;

/// Response body for a successful placement.
///
/// `confirmed` distinguishes a located order from the draft-only fallback;
/// the two are never collapsed. With `confirmed: false` the
/// `draft_order_id` and invoice-URL `thank_you_url` are the best available
/// reference, not a confirmed order.
#[derive(Debug, Serialize)]
pub struct CodOrderResponse {
    pub success: bool,
    pub confirmed: bool,
    pub message: &'static str,
    pub order_id: Option<i64>,
    pub order_number: Option<i64>,
    pub draft_order_id: Option<i64>,
    pub thank_you_url: Option<String>,
}

/// Place a COD order.
///
/// # Route
///
/// `POST /api/cod-orders/place`
pub async fn place(
    State(state): State<AppState>,
    Json(request): Json<OrderRequest>,
) -> Result<Json<CodOrderResponse>, AppError> {
    let outcome = state.cod().place(request).await?;

    let response = match outcome {
        CodOrderOutcome::Resolved {
            order_id,
            order_number,
            status_url,
        } => CodOrderResponse {
            success: true,
            confirmed: true,
            message: "COD order placed successfully",
            order_id: Some(order_id),
            order_number,
            draft_order_id: None,
            thank_you_url: status_url,
        },
        CodOrderOutcome::Unlocated {
            draft_order_id,
            invoice_url,
        } => CodOrderResponse {
            success: true,
            confirmed: false,
            message: "COD order submitted; confirmation pending",
            order_id: None,
            order_number: None,
            draft_order_id: Some(draft_order_id),
            thank_you_url: invoice_url,
        },
    };

    Ok(Json(response))
}
