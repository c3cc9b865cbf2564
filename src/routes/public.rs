use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// probe_routes
///
/// Mounted outside the admission gate so load balancers never get redirected.
pub fn probe_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(handlers::health))
}

/// public_routes
///
/// The exact-match public pages. They sit behind the gate like every page, and the
/// gate's public-route filter admits them before any identity check.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/sign-in", get(handlers::sign_in))
        .route("/sign-up", get(handlers::sign_up))
        .route("/pending-approval", get(handlers::pending_approval))
}
