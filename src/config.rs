use std::{env, path::PathBuf, time::Duration};

use crate::models::Role;

/// Fallback signing secret used outside production. Never valid for a deployed portal.
pub const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

const DEFAULT_CACHE_TIMEOUT_MS: u64 = 500;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// ConfigError
///
/// Startup-time configuration failures. `main` treats every variant as fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("failed to read route access table {path}: {source}")]
    TableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// CacheConfig
///
/// Connection details of the Redis REST endpoint holding the access windows.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub rest_url: String,
    pub rest_token: String,
    pub timeout: Duration,
}

/// AppConfig
///
/// Immutable configuration, loaded once at startup and shared through `AppState`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the dev bypass and the log format.
    pub env: Env,
    // HS256 secret the identity provider signs session tokens with.
    pub jwt_secret: String,
    // None in local runs without a cache: the in-memory schedule store is used instead.
    pub cache: Option<CacheConfig>,
    // Accept `x-user-role`/`x-user-group` headers in place of a token. Local only, opt-in.
    pub dev_bypass: bool,
    // The role subject to the per-group access schedule.
    pub restricted_role: Role,
    // Optional JSON route table; the built-in portal table is used when absent.
    pub route_table_file: Option<PathBuf>,
    pub bind_addr: String,
}

/// Env
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe configuration for tests: local mode with the header bypass, in-memory schedule
    /// store, built-in table.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            cache: None,
            dev_bypass: true,
            restricted_role: Role::Student,
            route_table_file: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the process environment. Production refuses to start
    /// without the session secret and the schedule cache credentials.
    pub fn load() -> Result<Self, ConfigError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match (env, env::var("SESSION_JWT_SECRET")) {
            (_, Ok(secret)) if !secret.is_empty() => secret,
            (Env::Production, _) => return Err(ConfigError::Missing("SESSION_JWT_SECRET")),
            (Env::Local, _) => LOCAL_JWT_SECRET.to_string(),
        };

        let timeout = match env::var("CACHE_TIMEOUT_MS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|e| ConfigError::Invalid {
                    var: "CACHE_TIMEOUT_MS",
                    reason: e.to_string(),
                })?,
            Err(_) => Duration::from_millis(DEFAULT_CACHE_TIMEOUT_MS),
        };

        let cache = match (env::var("CACHE_REST_URL"), env::var("CACHE_REST_TOKEN")) {
            (Ok(rest_url), Ok(rest_token)) => Some(CacheConfig {
                rest_url: rest_url.trim_end_matches('/').to_string(),
                rest_token,
                timeout,
            }),
            _ if env == Env::Production => {
                let missing = if env::var("CACHE_REST_URL").is_err() {
                    "CACHE_REST_URL"
                } else {
                    "CACHE_REST_TOKEN"
                };
                return Err(ConfigError::Missing(missing));
            }
            _ => None,
        };

        // Never honored in production, even when set.
        let dev_bypass = env == Env::Local
            && matches!(
                env::var("DEV_AUTH_BYPASS").as_deref().map(str::trim),
                Ok("1") | Ok("true")
            );

        let restricted_role = match env::var("RESTRICTED_ROLE") {
            Ok(raw) => raw.parse::<Role>().map_err(|e| ConfigError::Invalid {
                var: "RESTRICTED_ROLE",
                reason: e.to_string(),
            })?,
            Err(_) => Role::Student,
        };

        Ok(Self {
            env,
            jwt_secret,
            cache,
            dev_bypass,
            restricted_role,
            route_table_file: env::var("ROUTE_ACCESS_FILE").ok().map(PathBuf::from),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
        })
    }

    /// read_route_table
    ///
    /// Returns the raw JSON of the configured route table file, if one is configured.
    pub fn read_route_table(&self) -> Result<Option<String>, ConfigError> {
        match &self.route_table_file {
            Some(path) => std::fs::read_to_string(path)
                .map(Some)
                .map_err(|source| ConfigError::TableFile {
                    path: path.clone(),
                    source,
                }),
            None => Ok(None),
        }
    }
}
