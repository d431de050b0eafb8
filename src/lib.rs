//! # Scrapy-RS Sentry
//!
//! Sentry reporting extension for Scrapy-RS style web crawlers. It connects
//! the crawler's signal bus and exception hooks to Sentry: lifecycle signals
//! become informational messages, spider failures become captured exceptions
//! with the offending response and request attached.
//!
//! ## Components
//!
//! - **Extensions**: [`LogForwarder`] boots the client at startup,
//!   [`SignalForwarder`] reports configured signals, [`ErrorForwarder`]
//!   reports spider failures.
//! - **Middleware**: [`SentryMiddleware`] reports request and spider
//!   exceptions from the processing pipeline without suppressing them.
//! - **Client**: the [`ReportingClient`] seam over the Sentry SDK, with a
//!   recording [`mock::MockClient`] for tests.
//!
//! Reporting is configured through the `SENTRY_DSN`, `SENTRY_CLIENT_OPTIONS`,
//! `SENTRY_SIGNALS`, and `RELEASE` settings; without a DSN the extensions
//! fail setup with [`Error::NotConfigured`] and the crawl runs unreported.
//!
//! ## Example
//!
//! ```rust,no_run
//! use scrapy_rs_sentry::{ErrorForwarder, Settings, SignalManager};
//!
//! #[tokio::main]
//! async fn main() -> scrapy_rs_sentry::Result<()> {
//!     let settings = Settings::new()
//!         .with_setting("SENTRY_DSN", "https://key@sentry.example.com/1");
//!     let signals = SignalManager::new();
//!
//!     // Spider failures now flow to Sentry.
//!     let _forwarder = ErrorForwarder::from_settings(&settings, &signals).await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod extensions;
pub mod failure;
pub mod middleware;
pub mod mock;
pub mod request;
pub mod response;
pub mod scope;
pub mod serialize;
pub mod settings;
pub mod signal;
pub mod spider;

pub use client::{EventId, ReportingClient, SentryClient};
pub use error::{Error, Result};
pub use extensions::{ErrorForwarder, LogForwarder, SignalForwarder};
pub use failure::Failure;
pub use middleware::{ExceptionAction, ExceptionMiddleware, SentryMiddleware};
pub use request::{Method, Request};
pub use response::Response;
pub use scope::{Level, Scope};
pub use serialize::{request_to_dict, response_to_dict, SerializedRequest, SerializedResponse};
pub use settings::Settings;
pub use signal::{Signal, SignalArgs, SignalManager};
pub use spider::{BasicSpider, Spider};
