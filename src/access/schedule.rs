use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

use super::Decision;
use crate::{config::CacheConfig, models::AccessWindow};

/// Namespace of the access window keys in the schedule cache.
pub const KEY_PREFIX: &str = "course-access";

/// schedule_key
///
/// `course-access:{group}:{YYYY-MM-DD}`. The day is part of the key, so a window
/// stops applying when the calendar day rolls over regardless of the store's own TTL.
pub fn schedule_key(group: &str, day: NaiveDate) -> String {
    format!("{KEY_PREFIX}:{group}:{}", day.format("%Y-%m-%d"))
}

/// ScheduleError
///
/// Why a lookup produced no usable window. Carried inside `WindowLookup::Error` and
/// never propagated to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("schedule store unavailable: {0}")]
    Unavailable(String),
    #[error("schedule store answered with status {0}")]
    Status(u16),
    #[error("malformed access window: {0}")]
    Malformed(String),
}

/// WindowLookup
///
/// The three outcomes of a single schedule read. The gate maps every one of them to a
/// decision; none is allowed to escape as an error.
#[derive(Debug)]
pub enum WindowLookup {
    Found(AccessWindow),
    NotFound,
    Error(ScheduleError),
}

// 1. ScheduleStore Contract
/// ScheduleStore
///
/// Read-only view of the external store the administrative side writes access windows into.
/// Implementations perform exactly one read per call and never retry.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn lookup(&self, key: &str) -> WindowLookup;
}

/// The shared handle the gate holds on its schedule store.
pub type ScheduleState = Arc<dyn ScheduleStore>;

/// decode_window
///
/// Parses a stored window. Any decoding failure is reported as `Malformed`.
pub fn decode_window(raw: &str) -> Result<AccessWindow, ScheduleError> {
    serde_json::from_str(raw).map_err(|e| ScheduleError::Malformed(e.to_string()))
}

fn parse_wall_clock(value: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value.trim(), "%H:%M:%S"))
        .map_err(|_| ScheduleError::Malformed(format!("invalid wall-clock time '{value}'")))
}

/// window_bounds
///
/// Anchors the window's wall-clock times on `day`, yielding the inclusive
/// `[start, end]` range. An inverted window is returned as-is.
pub fn window_bounds(
    window: &AccessWindow,
    day: NaiveDate,
) -> Result<(NaiveDateTime, NaiveDateTime), ScheduleError> {
    let start = day.and_time(parse_wall_clock(&window.start_time)?);
    let end = day.and_time(parse_wall_clock(&window.end_time)?);
    Ok((start, end))
}

/// ScheduleGate
///
/// Time-window check applied to callers of the restricted role.
#[derive(Clone)]
pub struct ScheduleGate {
    store: ScheduleState,
    closed_path: String,
}

impl ScheduleGate {
    pub fn new(store: ScheduleState, closed_path: impl Into<String>) -> Self {
        Self {
            store,
            closed_path: closed_path.into(),
        }
    }

    pub fn closed_path(&self) -> &str {
        &self.closed_path
    }

    /// check
    ///
    /// Looks up today's window for `group` and redirects to the closed-access page when
    /// `now` lies strictly before its start or strictly after its end.
    /// A missing, unreadable or malformed window admits the caller.
    pub async fn check(&self, group: &str, now: NaiveDateTime) -> Decision {
        let day = now.date();
        let key = schedule_key(group, day);

        let window = match self.store.lookup(&key).await {
            WindowLookup::Found(window) => window,
            WindowLookup::NotFound => return Decision::Allow,
            WindowLookup::Error(e) => {
                tracing::warn!(%key, error = %e, "schedule lookup failed, admitting request");
                return Decision::Allow;
            }
        };

        match window_bounds(&window, day) {
            Ok((start, end)) if now < start || now > end => {
                tracing::debug!(%key, %now, %start, %end, "outside access window");
                Decision::Redirect(self.closed_path.clone())
            }
            Ok(_) => Decision::Allow,
            Err(e) => {
                tracing::warn!(%key, error = %e, "unusable access window, admitting request");
                Decision::Allow
            }
        }
    }
}

// 2. The Real Implementation (Redis over REST)
/// RestScheduleStore
///
/// Reads windows from a Redis REST endpoint: `GET {base}/get/{key}` with a bearer token,
/// answered by `{"result": <value or null>}` or `{"error": "..."}`.
#[derive(Clone)]
pub struct RestScheduleStore {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct RestReply {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

impl RestScheduleStore {
    pub fn new(config: &CacheConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.rest_url.clone(),
            token: config.rest_token.clone(),
        })
    }

    fn key_url(&self, key: &str) -> Result<reqwest::Url, ScheduleError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ScheduleError::Unavailable(format!("invalid cache url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ScheduleError::Unavailable("cache url cannot be a base".to_string()))?
            .pop_if_empty()
            .push("get")
            .push(key);
        Ok(url)
    }

    async fn fetch(&self, key: &str) -> Result<Option<AccessWindow>, ScheduleError> {
        let url = self.key_url(key)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| ScheduleError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScheduleError::Status(response.status().as_u16()));
        }

        let reply: RestReply = response
            .json()
            .await
            .map_err(|e| ScheduleError::Malformed(e.to_string()))?;

        if let Some(error) = reply.error {
            return Err(ScheduleError::Unavailable(error));
        }

        match reply.result {
            None | Some(serde_json::Value::Null) => Ok(None),
            // Values written as JSON strings come back as a string to decode.
            Some(serde_json::Value::String(raw)) => decode_window(&raw).map(Some),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ScheduleError::Malformed(e.to_string())),
        }
    }
}

#[async_trait]
impl ScheduleStore for RestScheduleStore {
    async fn lookup(&self, key: &str) -> WindowLookup {
        match self.fetch(key).await {
            Ok(Some(window)) => WindowLookup::Found(window),
            Ok(None) => WindowLookup::NotFound,
            Err(e) => WindowLookup::Error(e),
        }
    }
}

// 3. The In-Memory Implementation (Local runs and tests)
/// MemoryScheduleStore
///
/// Holds raw stored values keyed exactly like the remote cache, so corrupt entries can be
/// simulated with `put_raw`.
#[derive(Default)]
pub struct MemoryScheduleStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_window(&self, group: &str, day: NaiveDate, window: &AccessWindow) {
        // Serializing a struct of plain strings cannot fail.
        let raw = serde_json::to_string(window).unwrap_or_default();
        self.put_raw(&schedule_key(group, day), raw);
    }

    pub fn put_raw(&self, key: &str, raw: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), raw.into());
    }

    pub fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn lookup(&self, key: &str) -> WindowLookup {
        let raw = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned();

        match raw {
            Some(raw) => match decode_window(&raw) {
                Ok(window) => WindowLookup::Found(window),
                Err(e) => WindowLookup::Error(e),
            },
            None => WindowLookup::NotFound,
        }
    }
}

/// FailingScheduleStore
///
/// Simulates an unreachable cache: every lookup fails.
#[derive(Clone, Default)]
pub struct FailingScheduleStore;

#[async_trait]
impl ScheduleStore for FailingScheduleStore {
    async fn lookup(&self, _key: &str) -> WindowLookup {
        WindowLookup::Error(ScheduleError::Unavailable(
            "Mock Schedule Error: Simulation requested".to_string(),
        ))
    }
}
