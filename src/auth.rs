use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, Env},
    models::Role,
};

/// Cookie the identity provider stores the session token in for browser navigation.
pub const SESSION_COOKIE: &str = "__session";

/// Development-only headers accepted in place of a signed token when `Env::Local` runs with
/// `AppConfig::dev_bypass` enabled.
pub const DEV_ROLE_HEADER: &str = "x-user-role";
pub const DEV_GROUP_HEADER: &str = "x-user-group";

/// TokenClaims
///
/// Payload of the session token issued by the identity provider. The portal-specific
/// attributes live in the provider's public metadata.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (sub): the provider's user identifier.
    pub sub: String,
    /// Expiration Time (exp): tokens past this instant are rejected.
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
    #[serde(default)]
    pub metadata: TokenMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenMetadata {
    #[serde(default)]
    pub role: Option<String>,
    /// Cohort/program identifier, used as the schedule lookup key.
    #[serde(default)]
    pub group: Option<String>,
}

/// SessionClaims
///
/// The identity resolved for one request: an optional role and, for the restricted role only,
/// the caller's group. Never mutated after resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionClaims {
    pub role: Option<Role>,
    pub group: Option<String>,
}

impl SessionClaims {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(role: Role, group: Option<String>) -> Self {
        Self {
            role: Some(role),
            group,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.role.is_some()
    }

    /// from_metadata
    ///
    /// Normalizes raw provider attributes. An unknown role means no role at all; the group is
    /// kept only for `restricted` callers and only when non-empty.
    pub fn from_metadata(role: Option<&str>, group: Option<&str>, restricted: Role) -> Self {
        let Some(role) = role.and_then(|r| r.parse::<Role>().ok()) else {
            return Self::anonymous();
        };

        let group = group
            .map(str::trim)
            .filter(|g| !g.is_empty() && role == restricted)
            .map(str::to_string);

        Self::new(role, group)
    }
}

/// session_token
///
/// Finds the session token: a `Bearer` Authorization header first, then the session cookie.
pub fn session_token(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    bearer.or_else(|| {
        parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|cookies| cookies.split(';'))
            .find_map(|pair| {
                pair.trim()
                    .strip_prefix(SESSION_COOKIE)
                    .and_then(|rest| rest.strip_prefix('='))
            })
    })
}

/// decode_session
///
/// Verifies an HS256 session token (signature and expiry) and returns its claims.
pub fn decode_session(token: &str, secret: &str) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<TokenClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

/// resolve_claims
///
/// The Identity Resolver. Reads already-issued credentials only; any failure yields
/// anonymous claims, which the gate turns into a sign-in redirect where required.
pub fn resolve_claims(parts: &Parts, config: &AppConfig) -> SessionClaims {
    let restricted = config.restricted_role;

    // Local development bypass: claims straight from headers.
    if config.env == Env::Local && config.dev_bypass {
        if let Some(role) = header_str(parts, DEV_ROLE_HEADER) {
            let group = header_str(parts, DEV_GROUP_HEADER);
            return SessionClaims::from_metadata(Some(role), group, restricted);
        }
    }

    let Some(token) = session_token(parts) else {
        return SessionClaims::anonymous();
    };

    match decode_session(token, &config.jwt_secret) {
        Ok(claims) => SessionClaims::from_metadata(
            claims.metadata.role.as_deref(),
            claims.metadata.group.as_deref(),
            restricted,
        ),
        Err(e) => {
            tracing::debug!(error = %e, "session token rejected");
            SessionClaims::anonymous()
        }
    }
}

/// SessionClaims Extractor Implementation
///
/// Never rejects: an unauthenticated request is a valid input to the gate, not an error.
impl<S> FromRequestParts<S> for SessionClaims
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Claims already resolved by the gate for this request.
        if let Some(claims) = parts.extensions.get::<SessionClaims>() {
            return Ok(claims.clone());
        }

        let config = AppConfig::from_ref(state);
        Ok(resolve_claims(parts, &config))
    }
}
