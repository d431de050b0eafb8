use std::collections::HashMap;
use std::env;

use serde_json::Value;

use crate::error::{Error, Result};

/// Settings key for the Sentry connection string.
pub const SENTRY_DSN: &str = "SENTRY_DSN";

/// Settings key for extra client options passed to the Sentry client.
pub const SENTRY_CLIENT_OPTIONS: &str = "SENTRY_CLIENT_OPTIONS";

/// Settings key for the list of signal names (or dotted signal paths) to forward.
pub const SENTRY_SIGNALS: &str = "SENTRY_SIGNALS";

/// Settings key for an explicit release string.
pub const RELEASE: &str = "RELEASE";

/// Crawler settings, as seen by the Sentry extension.
///
/// A thin wrapper over the crawler's raw settings map with typed accessors
/// for the keys this extension reads. The DSN can also come from the
/// `SENTRY_DSN` environment variable.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    raw: HashMap<String, Value>,
}

impl Settings {
    /// Create an empty settings object
    pub fn new() -> Self {
        Self::default()
    }

    /// Create settings from an existing map
    pub fn from_map(raw: HashMap<String, Value>) -> Self {
        Self { raw }
    }

    /// Set a setting
    pub fn with_setting<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.raw.insert(key.into(), value.into());
        self
    }

    /// Get a raw setting
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }

    /// Get a setting as a string
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.raw.get(key).and_then(|v| v.as_str()).map(str::to_owned)
    }

    /// The DSN, from settings first, then the environment. Empty strings
    /// count as absent.
    pub fn dsn(&self) -> Option<String> {
        self.get_str(SENTRY_DSN)
            .filter(|v| !v.is_empty())
            .or_else(env_dsn)
    }

    /// The DSN, from the environment first, then settings. Error reporting
    /// setup resolves in this order.
    pub fn dsn_env_first(&self) -> Option<String> {
        env_dsn().or_else(|| self.get_str(SENTRY_DSN).filter(|v| !v.is_empty()))
    }

    /// Client options from `SENTRY_CLIENT_OPTIONS`. Missing means empty;
    /// anything other than an object is a settings error.
    pub fn client_options(&self) -> Result<HashMap<String, Value>> {
        match self.raw.get(SENTRY_CLIENT_OPTIONS) {
            None => Ok(HashMap::new()),
            Some(Value::Object(map)) => {
                Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            }
            Some(other) => Err(Error::settings(
                SENTRY_CLIENT_OPTIONS,
                format!("expected an object, got {}", other),
            )),
        }
    }

    /// Signal names from `SENTRY_SIGNALS`, in configured order. Missing means
    /// empty; anything other than an array of strings is a settings error.
    pub fn signal_names(&self) -> Result<Vec<String>> {
        match self.raw.get(SENTRY_SIGNALS) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_owned).ok_or_else(|| {
                        Error::settings(
                            SENTRY_SIGNALS,
                            format!("expected a string entry, got {}", item),
                        )
                    })
                })
                .collect(),
            Some(other) => Err(Error::settings(
                SENTRY_SIGNALS,
                format!("expected an array, got {}", other),
            )),
        }
    }

    /// The release override from `RELEASE`, if any
    pub fn release(&self) -> Option<String> {
        self.get_str(RELEASE).filter(|v| !v.is_empty())
    }
}

fn env_dsn() -> Option<String> {
    env::var(SENTRY_DSN).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dsn_from_settings() {
        let settings = Settings::new().with_setting(SENTRY_DSN, "https://key@sentry.example.com/1");
        assert_eq!(settings.dsn().unwrap(), "https://key@sentry.example.com/1");
        assert_eq!(
            settings.dsn_env_first().unwrap(),
            "https://key@sentry.example.com/1"
        );
    }

    #[test]
    fn test_client_options() {
        let settings = Settings::new().with_setting(
            SENTRY_CLIENT_OPTIONS,
            json!({"environment": "staging", "debug": true}),
        );
        let options = settings.client_options().unwrap();
        assert_eq!(options.get("environment").unwrap(), &json!("staging"));
        assert_eq!(options.get("debug").unwrap(), &json!(true));
    }

    #[test]
    fn test_client_options_default_empty() {
        assert!(Settings::new().client_options().unwrap().is_empty());
    }

    #[test]
    fn test_client_options_wrong_shape() {
        let settings = Settings::new().with_setting(SENTRY_CLIENT_OPTIONS, "not a map");
        assert!(matches!(
            settings.client_options(),
            Err(Error::Settings { .. })
        ));
    }

    #[test]
    fn test_signal_names_preserve_order() {
        let settings =
            Settings::new().with_setting(SENTRY_SIGNALS, json!(["spider_closed", "item_scraped"]));
        assert_eq!(
            settings.signal_names().unwrap(),
            vec!["spider_closed", "item_scraped"]
        );
    }

    #[test]
    fn test_signal_names_default_empty() {
        assert!(Settings::new().signal_names().unwrap().is_empty());
    }

    #[test]
    fn test_signal_names_wrong_shape() {
        let settings = Settings::new().with_setting(SENTRY_SIGNALS, json!([1, 2]));
        assert!(matches!(
            settings.signal_names(),
            Err(Error::Settings { .. })
        ));
    }

    #[test]
    fn test_release() {
        let settings = Settings::new().with_setting(RELEASE, "1.4.2");
        assert_eq!(settings.release().unwrap(), "1.4.2");
        assert!(Settings::new().release().is_none());
    }
}
