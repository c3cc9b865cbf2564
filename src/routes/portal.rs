use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// portal_routes
///
/// Pages behind the full admission pipeline. Static segments take precedence over the
/// `{section}` captures, so `/me` and `/course-closed` never reach `portal_page`.
pub fn portal_routes() -> Router<AppState> {
    Router::new()
        // GET /me
        // The session the gate admitted, for client-side navigation decisions.
        .route("/me", get(handlers::get_me))
        // GET /course-closed
        // Where restricted-role callers land outside their access window.
        .route("/course-closed", get(handlers::course_closed))
        // GET /list/*
        // Shared listings (grades, students, faculty...), authorized by the route table.
        .route("/list/{*rest}", get(handlers::portal_page))
        // GET /{role} and /{role}/*
        // Role homes and their sub-pages.
        .route("/{section}", get(handlers::portal_page))
        .route("/{section}/{*rest}", get(handlers::portal_page))
}
