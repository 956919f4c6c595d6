//! Opaque identifiers shared across every layer of the runtime.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

id_type!(SessionId, "Identifies a pool-owned browser session across its lifetime, including auto-recovery.");
id_type!(ActionId, "Identifies a single invocation of `executeAction`.");
id_type!(PageId, "Identifies the active page inside a session.");

/// A 10-character opaque handle id, per spec (`register(selector)` returns one of these).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct HandleId(pub String);

impl HandleId {
    const ALPHABET: &'static [u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    pub fn new() -> Self {
        let uuid = Uuid::new_v4();
        let bytes = uuid.as_bytes();
        let mut out = String::with_capacity(10);
        for b in bytes.iter().take(10) {
            let idx = (*b as usize) % Self::ALPHABET.len();
            out.push(Self::ALPHABET[idx] as char);
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for HandleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for HandleId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_id_is_ten_chars() {
        let id = HandleId::new();
        assert_eq!(id.as_str().len(), 10);
    }

    #[test]
    fn session_id_roundtrips_display() {
        let id = SessionId::from("abc-123");
        assert_eq!(id.to_string(), "abc-123");
    }
}
