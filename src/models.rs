use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Identity Schemas ---

/// Role
///
/// The closed set of caller classes recognised by the portal. The role is asserted by the
/// identity provider inside the session token and is the sole input of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Registrar,
    Faculty,
    Student,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Registrar, Role::Faculty, Role::Student];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Registrar => "registrar",
            Role::Faculty => "faculty",
            Role::Student => "student",
        }
    }

    /// home_path
    ///
    /// The role-home (`/{role}`): the landing page every authenticated caller can always reach.
    pub fn home_path(&self) -> String {
        format!("/{}", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a role name does not belong to the closed role set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "registrar" => Ok(Role::Registrar),
            "faculty" => Ok(Role::Faculty),
            "student" => Ok(Role::Student),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// SessionView
///
/// Response body of `GET /me` and of the stand-in portal pages: the identity the gate
/// resolved for the current request, plus where the caller's role-home lives.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct SessionView {
    pub path: String,
    pub role: Option<Role>,
    pub group: Option<String>,
    pub home: Option<String>,
}

// --- Schedule Schemas ---

/// AccessWindow
///
/// A per-group, per-day time range during which restricted-role callers may use the portal.
/// Written by the administrative side of the portal into the schedule cache as camelCase JSON,
/// e.g. `{"accessDate":"2026-10-19","startTime":"08:00","endTime":"17:00"}`.
/// The gate only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AccessWindow {
    /// Calendar day the window was written for (`YYYY-MM-DD`). Informational only.
    #[schema(example = "2026-10-19")]
    pub access_date: String,
    /// Wall-clock opening time (`HH:mm`), inclusive.
    #[schema(example = "08:00")]
    pub start_time: String,
    /// Wall-clock closing time (`HH:mm`), inclusive.
    #[schema(example = "17:00")]
    pub end_time: String,
}
