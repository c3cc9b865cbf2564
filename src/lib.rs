use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod access;
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;

// Routing segregation (ungated probes, public pages, gated portal pages).
pub mod routes;
use routes::{portal, public};

// --- Public Re-exports ---

pub use access::{AdmissionGate, Decision, GateError, GateState};
pub use config::{AppConfig, ConfigError};

/// ApiDoc
///
/// OpenAPI document for the gated portal surface, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health, handlers::sign_in, handlers::sign_up, handlers::pending_approval,
        handlers::course_closed, handlers::get_me
    ),
    components(schemas(models::SessionView, models::Role, models::AccessWindow)),
    tags((name = "grade-portal", description = "Grade portal admission gate"))
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable application state: the admission gate and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub gate: GateState,
    pub config: AppConfig,
}

impl FromRef<AppState> for GateState {
    fn from_ref(app_state: &AppState) -> GateState {
        app_state.gate.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// StartupError
///
/// Everything that can stop the service from coming up.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error("failed to build schedule cache client: {0}")]
    Cache(#[from] reqwest::Error),
}

/// build_gate
///
/// Compiles the route table (configured file or the built-in portal table) and picks the
/// schedule store: the REST cache when configured, the in-memory store otherwise.
pub fn build_gate(config: &AppConfig) -> Result<AdmissionGate, StartupError> {
    let table = match config.read_route_table()? {
        Some(raw) => access::RouteAccessTable::from_json(&raw)?,
        None => access::RouteAccessTable::compile(&access::default_rules())?,
    };
    tracing::info!(patterns = table.len(), "route access table compiled");

    let store: access::ScheduleState = match &config.cache {
        Some(cache) => {
            tracing::info!(url = %cache.rest_url, "using REST schedule cache");
            Arc::new(access::RestScheduleStore::new(cache)?)
        }
        None => {
            tracing::warn!("no schedule cache configured, using in-memory store");
            Arc::new(access::MemoryScheduleStore::new())
        }
    };

    Ok(AdmissionGate::new(table, store, config.restricted_role))
}

/// create_router
///
/// Assembles the routing structure: probes and docs are ungated, every page goes through
/// `admission_middleware`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // Gated pages: public ones are admitted by the gate's own filter.
    let gated = Router::new()
        .merge(public::public_routes())
        .merge(portal::portal_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            access::admission_middleware,
        ));

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::probe_routes())
        .merge(gated)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for every request, correlated by the generated `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
