use std::collections::HashSet;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{Decision, GateError};
use crate::models::Role;

/// RouteRule
///
/// One entry of the route access configuration, as written in the JSON table file:
/// `{"pattern": "/admin(.*)", "roles": ["admin"]}`. The pattern is anchored on both ends
/// when compiled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RouteRule {
    pub pattern: String,
    pub roles: Vec<String>,
}

impl RouteRule {
    pub fn new(pattern: &str, roles: &[Role]) -> Self {
        Self {
            pattern: pattern.to_string(),
            roles: roles.iter().map(|r| r.as_str().to_string()).collect(),
        }
    }
}

/// default_rules
///
/// The stock portal table. Ordered from most to least specific: the first matching
/// pattern decides, so `/list/grades` must precede `/list/(.*)`.
pub fn default_rules() -> Vec<RouteRule> {
    use Role::*;
    vec![
        RouteRule::new("/admin(.*)", &[Admin]),
        RouteRule::new("/registrar(.*)", &[Admin, Registrar]),
        RouteRule::new("/faculty(.*)", &[Admin, Faculty]),
        RouteRule::new("/student(.*)", &[Admin, Faculty, Student]),
        RouteRule::new("/list/grades", &[Admin, Registrar, Faculty, Student]),
        RouteRule::new("/list/(students|faculty)", &[Admin, Registrar, Faculty]),
        RouteRule::new("/list/(.*)", &[Admin, Registrar]),
    ]
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    pattern: String,
    matcher: Regex,
    roles: HashSet<Role>,
}

/// RouteAccessTable
///
/// Ordered list of pre-compiled path matchers, each paired with the roles it admits.
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct RouteAccessTable {
    routes: Vec<CompiledRoute>,
}

impl RouteAccessTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// compile
    ///
    /// Compiles the rules in declaration order. Fails on the first invalid pattern or
    /// unknown role name, so a broken table is caught at startup rather than per request.
    pub fn compile(rules: &[RouteRule]) -> Result<Self, GateError> {
        let routes = rules
            .iter()
            .map(|rule| -> Result<CompiledRoute, GateError> {
                let matcher = Regex::new(&format!("^(?:{})$", rule.pattern)).map_err(|source| {
                    GateError::InvalidPattern {
                        pattern: rule.pattern.clone(),
                        source,
                    }
                })?;
                let roles = rule
                    .roles
                    .iter()
                    .map(|name| name.parse::<Role>())
                    .collect::<Result<HashSet<_>, _>>()?;
                Ok(CompiledRoute {
                    pattern: rule.pattern.clone(),
                    matcher,
                    roles,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { routes })
    }

    /// from_json
    ///
    /// Parses a JSON array of `RouteRule`. Array order is evaluation order.
    pub fn from_json(raw: &str) -> Result<Self, GateError> {
        let rules: Vec<RouteRule> = serde_json::from_str(raw).map_err(GateError::MalformedTable)?;
        Self::compile(&rules)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Source patterns in evaluation order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.pattern.as_str())
    }

    /// Returns the pattern that governs `path`, if any.
    pub fn governing_pattern(&self, path: &str) -> Option<&str> {
        self.first_match(path).map(|r| r.pattern.as_str())
    }

    fn first_match(&self, path: &str) -> Option<&CompiledRoute> {
        self.routes.iter().find(|route| route.matcher.is_match(path))
    }

    /// authorize
    ///
    /// Decides `path` for an authenticated `role`:
    /// - the role-home (`/{role}`) is always allowed, without consulting the table;
    /// - otherwise the first matching pattern decides (allow, or redirect to role-home);
    /// - paths no pattern matches are allowed.
    pub fn authorize(&self, path: &str, role: Role) -> Decision {
        let home = role.home_path();
        if path == home {
            return Decision::Allow;
        }

        match self.first_match(path) {
            Some(route) if route.roles.contains(&role) => Decision::Allow,
            Some(route) => {
                tracing::debug!(%path, %role, pattern = %route.pattern, "role excluded by route table");
                Decision::Redirect(home)
            }
            None => Decision::Allow,
        }
    }
}
