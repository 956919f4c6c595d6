//! Persisted record shapes (spec §3): the core only needs CRUD over these
//! through the traits in [`crate::session_store`] and
//! [`crate::action_log`]; the SQL schema behind a real store is a
//! deployment detail out of scope here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Suspended,
    Closed,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub profile: Option<String>,
    pub status: SessionStatus,
    pub last_url: Option<String>,
    /// A JSON-encoded `SessionSnapshot` (spec §6), captured at `close` time
    /// so `restore` has a durable fallback once the live `BrowserSession`
    /// that took the in-memory snapshot is gone.
    #[serde(default)]
    pub snapshot: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `input` must already be sanitised by the caller before this is built;
/// the store persists whatever it is given verbatim.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub id: String,
    pub session_id: String,
    pub action: String,
    pub selector: Option<String>,
    pub input: Option<Value>,
    pub ok: bool,
    pub error_code: Option<String>,
    pub screenshot_path: Option<String>,
    pub duration_ms: u64,
    pub retries: u32,
    pub created_at: DateTime<Utc>,
}
