use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Severity attached to an outgoing report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Default for Level {
    fn default() -> Self {
        Self::Error
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            other => Err(Error::settings(
                "scope_level",
                format!("unknown level '{}'", other),
            )),
        }
    }
}

/// Per-report context bag: extra data, tags, and a severity level.
///
/// A scope is built fresh immediately before each report, passed into the
/// capture call, and dropped right after. It never outlives the submission.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Severity for the report
    pub level: Level,

    /// Free-form extra data attached to the report
    pub extra: BTreeMap<String, Value>,

    /// Short indexed key/value tags
    pub tags: BTreeMap<String, String>,
}

impl Scope {
    /// Create an empty scope at the default (error) level
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the severity level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Attach an extra value
    pub fn set_extra(&mut self, key: impl Into<String>, value: Value) {
        self.extra.insert(key.into(), value);
    }

    /// Attach a tag
    pub fn set_tag(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(key.into(), value.into());
    }

    /// Merge a map of extra values into the scope
    pub fn extend_extra(&mut self, entries: &HashMap<String, Value>) {
        for (key, value) in entries {
            self.extra.insert(key.clone(), value.clone());
        }
    }

    /// Merge a map of tags into the scope
    pub fn extend_tags(&mut self, entries: &HashMap<String, String>) {
        for (key, value) in entries {
            self.tags.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_round_trip() {
        for name in ["debug", "info", "warning", "error", "fatal"] {
            let level: Level = name.parse().unwrap();
            assert_eq!(level.to_string(), name);
        }
        assert!("verbose".parse::<Level>().is_err());
    }

    #[test]
    fn test_default_level_is_error() {
        assert_eq!(Scope::new().level, Level::Error);
    }

    #[test]
    fn test_scope_merging() {
        let mut scope = Scope::new().with_level(Level::Warning);
        scope.set_extra("spider", json!("quotes"));

        let mut extra = HashMap::new();
        extra.insert("attempt".to_string(), json!(2));
        let mut tags = HashMap::new();
        tags.insert("component".to_string(), "downloader".to_string());

        scope.extend_extra(&extra);
        scope.extend_tags(&tags);

        assert_eq!(scope.level, Level::Warning);
        assert_eq!(scope.extra.get("spider").unwrap(), &json!("quotes"));
        assert_eq!(scope.extra.get("attempt").unwrap(), &json!(2));
        assert_eq!(scope.tags.get("component").unwrap(), "downloader");
    }
}
