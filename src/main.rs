use grade_portal::{
    AppState,
    config::{AppConfig, Env},
    build_gate, create_router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, initializes logging, builds the admission gate and serves the portal.
#[tokio::main]
async fn main() {
    // 1. Configuration & Environment Loading (Fail-Fast)
    dotenv::dotenv().ok();
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: {e}");
            std::process::exit(1);
        }
    };

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "grade_portal=debug,tower_http=info".into());

    // 3. Pretty logs locally, JSON for log aggregation in production.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!(
        "Application starting in {:?} mode (restricted role: {})",
        config.env,
        config.restricted_role
    );

    if config.env == Env::Local {
        tracing::warn!("running in local mode: session tokens use the local fallback secret unless SESSION_JWT_SECRET is set");
    }
    if config.dev_bypass {
        tracing::warn!(
            "DEV_AUTH_BYPASS enabled: x-user-role/x-user-group headers are trusted without a token"
        );
    }

    // 4. Admission Gate (route table + schedule store)
    let gate = match build_gate(&config) {
        Ok(gate) => Arc::new(gate),
        Err(e) => {
            tracing::error!(error = %e, "FATAL: failed to build admission gate");
            std::process::exit(1);
        }
    };

    // 5. Router and Server Startup
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { gate, config });

    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %bind_addr, "FATAL: failed to bind listener");
            std::process::exit(1);
        }
    };

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server terminated");
    }
}
