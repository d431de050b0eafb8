use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::failure::Failure;
use crate::request::Request;
use crate::response::Response;
use crate::serialize::{request_to_dict, response_to_dict};
use crate::spider::Spider;

/// Signals emitted by the crawler over its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    /// Sent when the engine starts
    EngineStarted,
    /// Sent when the engine stops
    EngineStopped,
    /// Sent when a spider opens
    SpiderOpened,
    /// Sent when a spider closes
    SpiderClosed,
    /// Sent before a request is scheduled
    RequestScheduled,
    /// Sent after a request is sent
    RequestSent,
    /// Sent after a response is received
    ResponseReceived,
    /// Sent after an item is scraped
    ItemScraped,
    /// Sent when a spider raises an uncaught error
    SpiderError,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::EngineStarted => write!(f, "engine_started"),
            Signal::EngineStopped => write!(f, "engine_stopped"),
            Signal::SpiderOpened => write!(f, "spider_opened"),
            Signal::SpiderClosed => write!(f, "spider_closed"),
            Signal::RequestScheduled => write!(f, "request_scheduled"),
            Signal::RequestSent => write!(f, "request_sent"),
            Signal::ResponseReceived => write!(f, "response_received"),
            Signal::ItemScraped => write!(f, "item_scraped"),
            Signal::SpiderError => write!(f, "spider_error"),
        }
    }
}

impl FromStr for Signal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "engine_started" => Ok(Signal::EngineStarted),
            "engine_stopped" => Ok(Signal::EngineStopped),
            "spider_opened" => Ok(Signal::SpiderOpened),
            "spider_closed" => Ok(Signal::SpiderClosed),
            "request_scheduled" => Ok(Signal::RequestScheduled),
            "request_sent" => Ok(Signal::RequestSent),
            "response_received" => Ok(Signal::ResponseReceived),
            "item_scraped" => Ok(Signal::ItemScraped),
            "spider_error" => Ok(Signal::SpiderError),
            other => Err(Error::UnknownSignal(other.to_string())),
        }
    }
}

impl Signal {
    /// Resolve a signal name or dotted signal path against the registry of
    /// built-in signals. Paths like `crawler.signals.spider_error` or
    /// `crawler::signals::spider_error` resolve by their final segment.
    pub fn resolve(path: &str) -> Result<Self> {
        let name = path
            .rsplit(|c| c == '.' || c == ':')
            .next()
            .unwrap_or(path);
        name.parse()
    }
}

/// Signal arguments
#[derive(Clone)]
pub enum SignalArgs {
    /// No arguments
    None,
    /// Spider related
    Spider(Arc<dyn Spider>),
    /// Request related
    Request(Request),
    /// Response related
    Response(Response),
    /// A spider failure, with the response being processed when it raised
    Error {
        /// The raised failure
        failure: Failure,
        /// The response whose processing failed, if any
        response: Option<Response>,
        /// The spider that raised
        spider: Option<Arc<dyn Spider>>,
    },
    /// Custom arguments
    Custom(Value),
}

impl SignalArgs {
    /// The name of the spider carried by this payload, if any
    pub fn spider_name(&self) -> Option<&str> {
        match self {
            Self::Spider(spider) => Some(spider.name()),
            Self::Error {
                spider: Some(spider),
                ..
            } => Some(spider.name()),
            _ => None,
        }
    }

    /// A JSON rendering of the payload, suitable for attaching as scope extra
    pub fn to_extra(&self) -> Value {
        match self {
            Self::None => Value::Null,
            Self::Spider(spider) => json!({ "spider": spider.name() }),
            Self::Request(request) => {
                serde_json::to_value(request_to_dict(request)).unwrap_or(Value::Null)
            }
            Self::Response(response) => {
                serde_json::to_value(response_to_dict(response, false)).unwrap_or(Value::Null)
            }
            Self::Error { failure, .. } => json!({ "failure": failure.to_string() }),
            Self::Custom(value) => value.clone(),
        }
    }
}

impl fmt::Debug for SignalArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "SignalArgs::None"),
            Self::Spider(spider) => write!(f, "SignalArgs::Spider({})", spider.name()),
            Self::Request(request) => write!(f, "SignalArgs::Request({:?})", request),
            Self::Response(response) => write!(f, "SignalArgs::Response({:?})", response),
            Self::Error { failure, .. } => write!(f, "SignalArgs::Error({:?})", failure),
            Self::Custom(value) => write!(f, "SignalArgs::Custom({:?})", value),
        }
    }
}

/// Signal handler type
pub type SignalHandler = Box<dyn Fn(SignalArgs) -> Result<()> + Send + Sync + 'static>;

/// The crawler's signal bus. Handlers stay connected for the process
/// lifetime.
pub struct SignalManager {
    /// Signal handler mapping
    handlers: Arc<RwLock<HashMap<Signal, Vec<SignalHandler>>>>,
}

impl SignalManager {
    /// Create a new signal manager
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Connect a signal handler
    pub async fn connect<F>(&self, signal: Signal, handler: F) -> Result<()>
    where
        F: Fn(SignalArgs) -> Result<()> + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().await;
        handlers.entry(signal).or_default().push(Box::new(handler));
        Ok(())
    }

    /// Send a signal to all connected handlers
    pub async fn send(&self, signal: Signal, args: SignalArgs) -> Result<()> {
        let handlers = self.handlers.read().await;
        if let Some(handlers) = handlers.get(&signal) {
            for handler in handlers {
                handler(args.clone())?;
            }
        }
        Ok(())
    }

    /// Send a signal and log handler errors instead of propagating them
    pub async fn send_catch_log(&self, signal: Signal, args: SignalArgs) {
        if let Err(e) = self.send(signal, args).await {
            log::error!("Error sending signal {}: {}", signal, e);
        }
    }

    /// The number of handlers connected for a signal
    pub async fn handler_count(&self, signal: Signal) -> usize {
        let handlers = self.handlers.read().await;
        handlers.get(&signal).map(Vec::len).unwrap_or(0)
    }
}

impl Default for SignalManager {
    fn default() -> Self {
        Self::new()
    }
}
