//! Session-scoped value types (spec §3, §4.7).

use browser_driver::Cookie;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub url: String,
    pub cookies: Vec<Cookie>,
    pub local_storage: HashMap<String, String>,
    pub timestamp: DateTime<Utc>,
}
