//! Read-only client for the remote list service.
//!
//! The remote schema is versioned independently of the local model and is
//! never written back. `lm remote pull` copies a remote list into the local
//! collection as a new list; that is the only direction data flows.

use std::time::Duration;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::config::RemoteConfig;

/// Error type for remote fetches
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("{url} returned HTTP {code}")]
    Status { url: String, code: u16 },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        source: std::io::Error,
    },
    #[error("invalid remote list id '{0}'")]
    InvalidId(String),
}

impl RemoteError {
    /// Transport failures, 5xx and 429 are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Status { code, .. } => *code >= 500 || *code == 429,
            RemoteError::Transport { .. } => true,
            RemoteError::Decode { .. } | RemoteError::InvalidId(_) => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Remote schema
// ---------------------------------------------------------------------------

/// A list as returned by `GET /lists`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteList {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub pinned: bool,
}

/// A list as returned by `GET /lists/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteListDetail {
    #[serde(flatten)]
    pub list: RemoteList,
    #[serde(default)]
    pub user: Option<RemoteUser>,
    #[serde(default)]
    pub list_items: Vec<RemoteItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub done: bool,
}

impl RemoteListDetail {
    /// Item texts and done flags for a local copy. Unnamed items are dropped
    /// because local items can't be blank.
    pub fn local_entries(&self) -> Vec<(String, bool)> {
        self.list_items
            .iter()
            .filter_map(|item| {
                let name = item.name.as_deref()?.trim();
                (!name.is_empty()).then(|| (name.to_string(), item.done))
            })
            .collect()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Num(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> String {
        match raw {
            RawId::Str(s) => s,
            RawId::Num(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    RawId::deserialize(d).map(String::from)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(d).map(|raw| raw.map(String::from))
}

// ---------------------------------------------------------------------------
// Fetch state
// ---------------------------------------------------------------------------

/// What a view shows for a fetch: in flight, done, or failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteState<T> {
    Pending,
    Resolved(T),
    Failed(String),
}

impl<T> From<Result<T, RemoteError>> for RemoteState<T> {
    fn from(result: Result<T, RemoteError>) -> Self {
        match result {
            Ok(value) => RemoteState::Resolved(value),
            Err(e) => RemoteState::Failed(format!("An error has occurred: {}", e)),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct RemoteClient {
    agent: ureq::Agent,
    base_url: String,
    attempts: u32,
    backoff: Duration,
}

impl RemoteClient {
    pub fn new(config: &RemoteConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        RemoteClient {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            attempts: config.attempts,
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    pub fn fetch_lists(&self) -> Result<Vec<RemoteList>, RemoteError> {
        self.get_json("/lists")
    }

    pub fn fetch_list(&self, id: &str) -> Result<RemoteListDetail, RemoteError> {
        self.get_json(&list_path(id)?)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RemoteError> {
        let url = format!("{}{}", self.base_url, path);
        with_retry(self.attempts, self.backoff, std::thread::sleep, |attempt| {
            tracing::debug!(%url, attempt, "fetching");
            let response = self
                .agent
                .get(&url)
                .set("Accept", "application/json")
                .set("User-Agent", "listmachine")
                .call()
                .map_err(|e| match e {
                    ureq::Error::Status(code, _) => RemoteError::Status {
                        url: url.clone(),
                        code,
                    },
                    ureq::Error::Transport(t) => RemoteError::Transport {
                        url: url.clone(),
                        message: t.to_string(),
                    },
                })?;
            response.into_json::<T>().map_err(|e| RemoteError::Decode {
                url: url.clone(),
                source: e,
            })
        })
    }
}

/// Unreserved characters stay as they are; everything else in an id is escaped.
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'~');

/// Request path for one list. The id is a single escaped path segment.
fn list_path(id: &str) -> Result<String, RemoteError> {
    let id = id.trim();
    if id.is_empty() || id == "." || id == ".." {
        return Err(RemoteError::InvalidId(id.to_string()));
    }
    Ok(format!("/lists/{}", utf8_percent_encode(id, SEGMENT_ENCODE_SET)))
}

/// Run `op` up to `attempts` times, sleeping `backoff`, `2 * backoff`, …
/// between retryable failures.
pub fn with_retry<T>(
    attempts: u32,
    backoff: Duration,
    mut sleep: impl FnMut(Duration),
    mut op: impl FnMut(u32) -> Result<T, RemoteError>,
) -> Result<T, RemoteError> {
    let attempts = attempts.max(1);
    let mut delay = backoff;
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && e.is_retryable() => {
                tracing::warn!(error = %e, attempt, "remote fetch failed, retrying");
                sleep(delay);
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
