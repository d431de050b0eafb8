use std::collections::HashMap;
use std::fmt;

use log::debug;
use sentry::ClientInitGuard;
use serde_json::Value;

use crate::failure::Failure;
use crate::scope::{Level, Scope};

/// Backend-assigned identifier for a submitted report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventId(String);

impl EventId {
    /// Create an event id from its string form
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Narrow interface to the error-reporting backend.
///
/// Submission is fire-and-forget: a dropped or rejected report yields `None`,
/// never an error. Implementations must apply the whole scope before
/// submitting and must not let scope state leak between reports.
pub trait ReportingClient: Send + Sync + 'static {
    /// Submit an informational message with the given scope
    fn capture_message(&self, message: &str, scope: &Scope) -> Option<EventId>;

    /// Submit a failure as a captured exception with the given scope
    fn capture_failure(&self, failure: &Failure, scope: &Scope) -> Option<EventId>;
}

/// Sentry-backed reporting client.
///
/// Holds the init guard so the transport stays alive for the process
/// lifetime. Initialization is best-effort: a malformed DSN or option value
/// disables the client instead of erroring, and re-initializing simply
/// rebinds the global hub (last call wins).
pub struct SentryClient {
    _guard: ClientInitGuard,
}

impl SentryClient {
    /// Initialize the global Sentry hub from a DSN and a map of client
    /// options. Unrecognized option keys are skipped.
    pub fn init(dsn: &str, options: &HashMap<String, Value>) -> Self {
        let mut opts = sentry::ClientOptions::default();
        opts.dsn = dsn.parse().ok();
        if opts.dsn.is_none() {
            debug!("Sentry DSN did not parse; reporting is disabled");
        }

        for (key, value) in options {
            match key.as_str() {
                "release" => opts.release = value.as_str().map(|s| s.to_owned().into()),
                "environment" => opts.environment = value.as_str().map(|s| s.to_owned().into()),
                "server_name" => opts.server_name = value.as_str().map(|s| s.to_owned().into()),
                "debug" => opts.debug = value.as_bool().unwrap_or(false),
                "send_default_pii" => opts.send_default_pii = value.as_bool().unwrap_or(false),
                "sample_rate" => {
                    if let Some(rate) = value.as_f64() {
                        opts.sample_rate = rate as f32;
                    }
                }
                "traces_sample_rate" => {
                    if let Some(rate) = value.as_f64() {
                        opts.traces_sample_rate = rate as f32;
                    }
                }
                "max_breadcrumbs" => {
                    if let Some(max) = value.as_u64() {
                        opts.max_breadcrumbs = max as usize;
                    }
                }
                other => debug!("Skipping unknown Sentry client option '{}'", other),
            }
        }

        Self {
            _guard: sentry::init(opts),
        }
    }

    fn apply(scope: &Scope, sentry_scope: &mut sentry::Scope) {
        sentry_scope.set_level(Some(to_sentry_level(scope.level)));
        for (key, value) in &scope.extra {
            sentry_scope.set_extra(key, value.clone());
        }
        for (key, value) in &scope.tags {
            sentry_scope.set_tag(key, value);
        }
    }
}

impl ReportingClient for SentryClient {
    fn capture_message(&self, message: &str, scope: &Scope) -> Option<EventId> {
        let id = sentry::with_scope(
            |sentry_scope| Self::apply(scope, sentry_scope),
            || sentry::capture_message(message, to_sentry_level(scope.level)),
        );
        event_id(id)
    }

    fn capture_failure(&self, failure: &Failure, scope: &Scope) -> Option<EventId> {
        let id = sentry::with_scope(
            |sentry_scope| Self::apply(scope, sentry_scope),
            || sentry::capture_error(failure.error()),
        );
        event_id(id)
    }
}

fn to_sentry_level(level: Level) -> sentry::Level {
    match level {
        Level::Debug => sentry::Level::Debug,
        Level::Info => sentry::Level::Info,
        Level::Warning => sentry::Level::Warning,
        Level::Error => sentry::Level::Error,
        Level::Fatal => sentry::Level::Fatal,
    }
}

// A nil uuid means no client accepted the event.
fn event_id(id: sentry::types::Uuid) -> Option<EventId> {
    if id.is_nil() {
        None
    } else {
        Some(EventId::new(id.to_string()))
    }
}
