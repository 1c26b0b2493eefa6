use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an error across sessions: 8 lowercase hex characters derived
/// from the normalized error text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorFingerprint(String);

impl ErrorFingerprint {
    /// Create a new ErrorFingerprint from a hex digest
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Get the fingerprint as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ErrorFingerprint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ErrorFingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for ErrorFingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
