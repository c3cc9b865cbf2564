//! Request admission gate.
//!
//! Every gated request is decided in a fixed order before any handler runs:
//!
//! 1. public routes pass untouched;
//! 2. callers without a role are sent to sign-in;
//! 3. a caller's own role-home always passes;
//! 4. the route table (first match wins) may send the caller back to their role-home;
//! 5. restricted-role callers with a group must be inside today's access window.
//!
//! The outcome of each step is a [`Decision`]; nothing in here produces an error response.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDateTime;

pub mod public;
pub mod routes;
pub mod schedule;

pub use public::{PUBLIC_ROUTES, is_public_route};
pub use routes::{RouteAccessTable, RouteRule, default_rules};
pub use schedule::{
    FailingScheduleStore, MemoryScheduleStore, RestScheduleStore, ScheduleError, ScheduleGate,
    ScheduleState, ScheduleStore, WindowLookup, schedule_key,
};

use crate::{auth::SessionClaims, models::{Role, UnknownRole}};

pub const SIGN_IN_PATH: &str = "/sign-in";
pub const CLOSED_ACCESS_PATH: &str = "/course-closed";

/// Decision
///
/// Terminal state of the gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Redirect(String),
}

/// GateError
///
/// Failures while building the route table. Only raised at startup.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),
    #[error("malformed route access table: {0}")]
    MalformedTable(#[source] serde_json::Error),
}

/// AdmissionGate
///
/// Holds the compiled route table and the schedule gate. Immutable once built; shared
/// between requests through `GateState`.
pub struct AdmissionGate {
    table: RouteAccessTable,
    schedule: ScheduleGate,
    restricted_role: Role,
}

pub type GateState = Arc<AdmissionGate>;

impl AdmissionGate {
    pub fn new(table: RouteAccessTable, store: ScheduleState, restricted_role: Role) -> Self {
        Self {
            table,
            schedule: ScheduleGate::new(store, CLOSED_ACCESS_PATH),
            restricted_role,
        }
    }

    pub fn table(&self) -> &RouteAccessTable {
        &self.table
    }

    pub fn restricted_role(&self) -> Role {
        self.restricted_role
    }

    /// evaluate
    ///
    /// Decides one request. Depends only on its arguments and the schedule store's answer,
    /// so repeated calls with the same inputs yield the same decision.
    ///
    /// The caller's role-home is allowed before the schedule is consulted: a restricted
    /// caller outside their access window still reaches `/{role}`, and only other pages
    /// redirect to the closed-access page.
    pub async fn evaluate(&self, path: &str, claims: &SessionClaims, now: NaiveDateTime) -> Decision {
        if is_public_route(path) {
            return Decision::Allow;
        }

        let Some(role) = claims.role else {
            return Decision::Redirect(SIGN_IN_PATH.to_string());
        };

        // Role-home is terminal: it stays reachable even outside the access window.
        if path == role.home_path() {
            return Decision::Allow;
        }

        if let redirect @ Decision::Redirect(_) = self.table.authorize(path, role) {
            return redirect;
        }

        // The closed-access page itself is exempt, otherwise the redirect would loop.
        if role == self.restricted_role && path != self.schedule.closed_path() {
            if let Some(group) = claims.group.as_deref() {
                return self.schedule.check(group, now).await;
            }
        }

        Decision::Allow
    }
}

/// admission_middleware
///
/// Runs the gate in front of every gated route. On allow, the resolved claims are placed in
/// the request extensions for the handlers; otherwise a temporary redirect is returned.
pub async fn admission_middleware(
    State(gate): State<GateState>,
    claims: SessionClaims,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let now = chrono::Local::now().naive_local();

    match gate.evaluate(&path, &claims, now).await {
        Decision::Allow => {
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Decision::Redirect(to) => {
            tracing::debug!(%path, role = ?claims.role, redirect = %to, "request redirected by gate");
            Redirect::temporary(&to).into_response()
        }
    }
}
