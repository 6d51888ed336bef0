//! Unified error handling for the HTTP surface.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::cod::PlaceOrderError;
use crate::db::StoreError;
use crate::services::geocoder::GeocoderError;
use crate::shopify::oauth::OauthError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// COD workflow failure.
    #[error(transparent)]
    Order(#[from] PlaceOrderError),

    /// Geocoder passthrough failure.
    #[error(transparent)]
    Geocoder(#[from] GeocoderError),

    /// OAuth install flow failure.
    #[error(transparent)]
    Oauth(#[from] OauthError),

    /// Credential store failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Feature not configured on this deployment.
    #[error("{0}")]
    Unavailable(&'static str),
}

/// JSON error body, matching the storefront widget's expected shape.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Order(err) => match err {
                PlaceOrderError::Validation { .. } | PlaceOrderError::InvalidField { .. } => {
                    StatusCode::BAD_REQUEST
                }
                PlaceOrderError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
                PlaceOrderError::OrderCreation(_) => StatusCode::BAD_GATEWAY,
                PlaceOrderError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Geocoder(_) => StatusCode::BAD_GATEWAY,
            Self::Oauth(err) => match err {
                OauthError::InvalidHmac => StatusCode::UNAUTHORIZED,
                OauthError::Exchange { .. } | OauthError::Http(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether this error should be reported to Sentry.
    fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Store(_)
                | Self::Geocoder(_)
                | Self::Order(PlaceOrderError::OrderCreation(_) | PlaceOrderError::Store(_))
                | Self::Oauth(OauthError::Exchange { .. } | OauthError::Http(_))
        )
    }

    /// Message exposed to clients; upstream details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Order(PlaceOrderError::OrderCreation(_)) => {
                "Failed to create COD order".to_string()
            }
            Self::Order(PlaceOrderError::Store(_)) | Self::Store(_) => {
                "Internal server error".to_string()
            }
            Self::Geocoder(_) => "Failed to fetch address suggestions.".to_string(),
            Self::Oauth(OauthError::Exchange { .. } | OauthError::Http(_)) => {
                "OAuth token exchange failed".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "request error"
            );
        }

        let status = self.status_code();
        let body = ErrorBody {
            success: false,
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}
