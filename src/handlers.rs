use axum::{Json, http::Uri};

use crate::{auth::SessionClaims, models::SessionView};

fn session_view(path: &str, claims: SessionClaims) -> SessionView {
    SessionView {
        path: path.to_string(),
        home: claims.role.map(|role| role.home_path()),
        role: claims.role,
        group: claims.group,
    }
}

// --- Probe ---

/// health
///
/// [Ungated] Liveness probe for load balancers. Mounted outside the admission gate.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

// --- Public Pages ---

/// sign_in
///
/// [Public Route] Stand-in for the identity provider's sign-in page.
#[utoipa::path(get, path = "/sign-in", responses((status = 200, description = "Sign-in page")))]
pub async fn sign_in() -> &'static str {
    "sign-in"
}

/// sign_up
///
/// [Public Route] Stand-in for the identity provider's sign-up page.
#[utoipa::path(get, path = "/sign-up", responses((status = 200, description = "Sign-up page")))]
pub async fn sign_up() -> &'static str {
    "sign-up"
}

/// pending_approval
///
/// [Public Route] Shown to accounts that exist but have not been assigned a role yet.
#[utoipa::path(
    get,
    path = "/pending-approval",
    responses((status = 200, description = "Pending approval page"))
)]
pub async fn pending_approval() -> &'static str {
    "pending-approval"
}

// --- Gated Pages ---

/// course_closed
///
/// [Gated Route] Destination of schedule redirects. Requires a session but is never itself
/// subject to the access window.
#[utoipa::path(
    get,
    path = "/course-closed",
    responses(
        (status = 200, description = "Closed-access page"),
        (status = 307, description = "Redirect to sign-in")
    )
)]
pub async fn course_closed() -> &'static str {
    "course access is closed at this time"
}

/// get_me
///
/// [Gated Route] Returns the identity the gate resolved for this request.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Resolved session", body = SessionView),
        (status = 307, description = "Redirect to sign-in")
    )
)]
pub async fn get_me(claims: SessionClaims) -> Json<SessionView> {
    Json(session_view("/me", claims))
}

/// portal_page
///
/// [Gated Route] Stand-in for every portal page (role homes, `/list/*`). Rendering is not
/// part of this service; the page echoes the session it was admitted with.
pub async fn portal_page(uri: Uri, claims: SessionClaims) -> Json<SessionView> {
    Json(session_view(uri.path(), claims))
}
