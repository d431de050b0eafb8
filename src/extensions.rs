//! Crawler extensions that forward signals and spider failures to Sentry.
//!
//! Use the `SENTRY_DSN` setting (or environment variable) to enable
//! reporting. Each extension resolves its configuration in `from_settings`,
//! fails with [`Error::NotConfigured`] when no DSN exists, and otherwise
//! connects its handlers to the crawler's signal bus for the rest of the
//! process lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use crate::client::{EventId, ReportingClient, SentryClient};
use crate::error::{Error, Result};
use crate::scope::{Level, Scope};
use crate::serialize::response_to_dict;
use crate::settings::Settings;
use crate::signal::{Signal, SignalArgs, SignalManager};

/// Extension that boots the Sentry client at crawler startup and keeps it
/// alive. Exposes no runtime hooks beyond initialization.
pub struct LogForwarder {
    _client: SentryClient,
}

impl LogForwarder {
    /// Initialize the reporting client from crawler settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let dsn = settings
            .dsn()
            .ok_or_else(|| Error::not_configured("no SENTRY_DSN in settings"))?;
        let client = SentryClient::init(&dsn, &settings.client_options()?);
        Ok(Self { _client: client })
    }
}

/// Extension that reports configured crawler signals as Sentry messages
pub struct SignalForwarder {
    client: Arc<dyn ReportingClient>,
}

impl SignalForwarder {
    /// Create a forwarder around an existing reporting client
    pub fn with_client(client: Arc<dyn ReportingClient>) -> Arc<Self> {
        Arc::new(Self { client })
    }

    /// Initialize from crawler settings and subscribe to every signal named
    /// in `SENTRY_SIGNALS`. An empty list leaves the forwarder inert.
    pub async fn from_settings(
        settings: &Settings,
        signals: &SignalManager,
    ) -> Result<Arc<Self>> {
        let dsn = settings
            .dsn()
            .ok_or_else(|| Error::not_configured("no SENTRY_DSN in settings or environment"))?;
        let names = settings.signal_names()?;
        let subscriptions = names
            .iter()
            .map(|name| name.parse())
            .collect::<Result<Vec<Signal>>>()?;

        let client = Arc::new(SentryClient::init(&dsn, &settings.client_options()?));
        let forwarder = Self::with_client(client);
        forwarder.subscribe(signals, &subscriptions).await?;
        Ok(forwarder)
    }

    /// Connect this forwarder's handler for each of the given signals
    pub async fn subscribe(
        self: &Arc<Self>,
        signals: &SignalManager,
        subscriptions: &[Signal],
    ) -> Result<()> {
        for &signal in subscriptions {
            let forwarder = Arc::clone(self);
            signals
                .connect(signal, move |args| {
                    forwarder.handle(signal, &args);
                    Ok(())
                })
                .await?;
        }
        Ok(())
    }

    /// Report one signal firing as an informational message. Returns the
    /// backend-assigned event id, or `None` when the backend dropped the
    /// report. Never propagates a failure of its own.
    pub fn handle(&self, signal: Signal, args: &SignalArgs) -> Option<EventId> {
        let mut scope = Scope::new().with_level(Level::Info);
        scope.set_extra("signal", Value::from(signal.to_string()));
        if let Some(sender) = args.spider_name() {
            scope.set_extra("sender", Value::from(sender));
        }
        scope.set_extra("args", args.to_extra());

        let ident = self.client.capture_message(&signal.to_string(), &scope);
        debug!("Reported signal {} as {:?}", signal, ident);
        ident
    }
}

/// Extension that reports spider failures as captured Sentry exceptions
pub struct ErrorForwarder {
    client: Arc<dyn ReportingClient>,
    tags: HashMap<String, String>,
    extra: HashMap<String, Value>,
    level: Level,
}

impl ErrorForwarder {
    /// Create a forwarder around an existing reporting client
    pub fn with_client(client: Arc<dyn ReportingClient>) -> Self {
        Self {
            client,
            tags: HashMap::new(),
            extra: HashMap::new(),
            level: Level::Error,
        }
    }

    /// Tags merged into every report's scope
    pub fn with_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Extra data merged into every report's scope
    pub fn with_extra(mut self, extra: HashMap<String, Value>) -> Self {
        self.extra = extra;
        self
    }

    /// Severity for every report (defaults to error)
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Initialize from crawler settings. The DSN comes from the environment
    /// first, then settings. `SENTRY_SIGNALS` entries may be plain signal
    /// names or dotted signal paths; an empty list subscribes to the
    /// built-in spider-error signal only.
    pub async fn from_settings(
        settings: &Settings,
        signals: &SignalManager,
    ) -> Result<Arc<Self>> {
        let dsn = settings
            .dsn_env_first()
            .ok_or_else(|| Error::not_configured("no SENTRY_DSN in environment or settings"))?;

        let mut options = settings.client_options()?;
        if let Some(release) = settings.release() {
            options
                .entry("release".to_string())
                .or_insert_with(|| Value::from(release));
        }

        let paths = settings.signal_names()?;
        let subscriptions = if paths.is_empty() {
            vec![Signal::SpiderError]
        } else {
            paths
                .iter()
                .map(|path| Signal::resolve(path))
                .collect::<Result<Vec<_>>>()?
        };

        let client = Arc::new(SentryClient::init(&dsn, &options));
        let forwarder = Arc::new(Self::with_client(client));
        forwarder.subscribe(signals, &subscriptions).await?;
        Ok(forwarder)
    }

    /// Connect this forwarder's handler for each of the given signals
    pub async fn subscribe(
        self: &Arc<Self>,
        signals: &SignalManager,
        subscriptions: &[Signal],
    ) -> Result<()> {
        for &signal in subscriptions {
            let forwarder = Arc::clone(self);
            signals
                .connect(signal, move |args| {
                    forwarder.handle(signal, &args);
                    Ok(())
                })
                .await?;
        }
        Ok(())
    }

    /// Report a spider failure. Builds a scope with the failure, the
    /// serialized response (including its originating request), and the
    /// traceback text, merges the configured tags/extra, and submits the
    /// failure as a captured exception. Returns the backend-assigned event
    /// id, or `None` when the backend dropped the report. Reporting must
    /// never crash the crawl, so this propagates nothing.
    pub fn handle(&self, signal: Signal, args: &SignalArgs) -> Option<EventId> {
        let SignalArgs::Error {
            failure,
            response,
            spider,
        } = args
        else {
            debug!("Ignoring non-error payload for signal {}", signal);
            return None;
        };

        let mut scope = Scope::new().with_level(self.level);
        scope.set_extra("signal", Value::from(signal.to_string()));
        scope.set_extra("failure", Value::from(failure.to_string()));
        if let Some(spider) = spider {
            scope.set_extra("sender", Value::from(spider.name()));
            scope.set_extra("spider", Value::from(spider.name()));
        }
        if let Some(response) = response {
            let snapshot = response_to_dict(response, true);
            scope.set_extra(
                "response",
                serde_json::to_value(&snapshot).unwrap_or(Value::Null),
            );
        }
        if let Some(traceback) = failure.traceback() {
            scope.set_extra("traceback", Value::from(traceback));
        }
        scope.extend_extra(&self.extra);
        scope.extend_tags(&self.tags);

        let ident = self.client.capture_failure(failure, &scope);
        match &ident {
            Some(id) => warn!("Sentry exception id '{}'", id),
            None => warn!("Sentry exception report for '{}' was dropped", failure),
        }
        ident
    }
}
