use thiserror::Error;

/// Error types for the Sentry extension
#[derive(Error, Debug)]
pub enum Error {
    /// Reporting is disabled: no DSN in settings or environment
    #[error("Sentry reporting is not configured: {0}")]
    NotConfigured(String),

    /// A configured signal name does not resolve against the signal registry
    #[error("Unknown signal name: {0}")]
    UnknownSignal(String),

    /// A settings value has the wrong shape
    #[error("Invalid setting {key}: {message}")]
    Settings {
        /// The offending settings key
        key: String,
        /// What was wrong with the value
        message: String,
    },

    /// Error when parsing a URL
    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),
}

impl Error {
    /// Create a new not-configured error
    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::NotConfigured(message.into())
    }

    /// Create a new settings error
    pub fn settings(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Settings {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Result type for Sentry extension operations
pub type Result<T> = std::result::Result<T, Error>;
