//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database ping)
//!
//! # OAuth install flow
//! GET  /auth                   - Redirect the merchant to Shopify's consent page
//! GET  /auth/callback          - Verify HMAC, exchange code, store the token
//!
//! # COD orders
//! POST /api/cod-orders/place   - Place a cash-on-delivery order
//!
//! # Address autocomplete
//! GET  /api/address            - Forwarded geocoder suggestions (?q=...)
//! ```

pub mod address;
pub mod auth;
pub mod orders;

use axum::Router;
use axum::routing::{get, post};

use crate::middleware::require_address_token;
use crate::state::AppState;

/// Build the application router.
///
/// `state` is needed up front for the address-token middleware; the router
/// itself is still stateful and expects `with_state` from the caller.
pub fn routes(state: AppState) -> Router<AppState> {
    let address = Router::new()
        .route("/api/address", get(address::suggestions))
        .layer(axum::middleware::from_fn_with_state(
            state,
            require_address_token,
        ));

    Router::new()
        .route("/auth", get(auth::install))
        .route("/auth/callback", get(auth::callback))
        .route("/api/cod-orders/place", post(orders::place))
        .merge(address)
}
