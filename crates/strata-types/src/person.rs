use std::fmt;

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Identity of a commit author or committer, stamped with a time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Person {
    /// Display name, if known.
    pub name: Option<String>,
    /// Email address, if known.
    pub email: Option<String>,
    /// Milliseconds since the UNIX epoch.
    pub timestamp_ms: i64,
    /// Offset from UTC in minutes.
    pub tz_offset_min: i32,
}

impl Person {
    /// Create a person with an explicit timestamp.
    pub fn new(
        name: Option<String>,
        email: Option<String>,
        timestamp_ms: i64,
        tz_offset_min: i32,
    ) -> Self {
        Self {
            name,
            email,
            timestamp_ms,
            tz_offset_min,
        }
    }

    /// Create a person stamped with the current UTC wall-clock time.
    pub fn now(name: Option<String>, email: Option<String>) -> Self {
        Self::new(name, email, Utc::now().timestamp_millis(), 0)
    }

    /// An anonymous identity at the epoch, handy for deterministic fixtures.
    pub fn anonymous() -> Self {
        Self::new(None, None, 0, 0)
    }

    /// Same identity with a different timestamp.
    pub fn at(&self, timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            ..self.clone()
        }
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_deref().unwrap_or("<unknown>");
        match &self.email {
            Some(email) => write!(f, "{name} <{email}>")?,
            None => write!(f, "{name}")?,
        }
        if let Some(when) = Utc.timestamp_millis_opt(self.timestamp_ms).single() {
            write!(f, " {}", when.to_rfc3339())?;
        }
        Ok(())
    }
}
