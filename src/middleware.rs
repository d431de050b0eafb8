//! Downloader and spider middleware hooks that report failures to Sentry.

use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use serde_json::Value;

use crate::client::{EventId, ReportingClient, SentryClient};
use crate::error::{Error, Result};
use crate::failure::Failure;
use crate::request::Request;
use crate::response::Response;
use crate::scope::Scope;
use crate::serialize::{request_to_dict, response_to_dict};
use crate::settings::Settings;
use crate::spider::Spider;

/// What the engine should do with a failure after a middleware saw it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionAction {
    /// Keep the failure flowing through the engine's own error handling,
    /// unchanged
    Propagate,
}

/// Hooks invoked by the engine when request processing or spider parsing
/// fails
#[async_trait]
pub trait ExceptionMiddleware: Send + Sync + 'static {
    /// Called when downloading or processing a request fails
    async fn process_exception(
        &self,
        request: &Request,
        failure: &Failure,
        spider: &dyn Spider,
    ) -> ExceptionAction;

    /// Called when a spider callback fails while handling a response
    async fn process_spider_exception(
        &self,
        response: &Response,
        failure: &Failure,
        spider: &dyn Spider,
    ) -> ExceptionAction;
}

/// Middleware that forwards failures to Sentry and never suppresses them
pub struct SentryMiddleware {
    client: Arc<dyn ReportingClient>,
}

impl SentryMiddleware {
    /// Create a middleware around an existing reporting client
    pub fn with_client(client: Arc<dyn ReportingClient>) -> Self {
        Self { client }
    }

    /// Initialize from crawler settings. The DSN comes from the environment
    /// first, then settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let dsn = settings
            .dsn_env_first()
            .ok_or_else(|| Error::not_configured("no SENTRY_DSN in environment or settings"))?;
        let client = Arc::new(SentryClient::init(&dsn, &settings.client_options()?));
        Ok(Self::with_client(client))
    }

    /// Submit one failure with the spider name and whichever of
    /// request/response is in play. The crawl continues whatever happens
    /// here, so reporting failures are absorbed.
    fn report(
        &self,
        failure: &Failure,
        spider: &dyn Spider,
        key: &str,
        value: Value,
    ) -> Option<EventId> {
        let mut scope = Scope::new();
        scope.set_extra("spider", Value::from(spider.name()));
        scope.set_extra(key, value);
        if let Some(traceback) = failure.traceback() {
            scope.set_extra("traceback", Value::from(traceback));
        }

        let ident = self.client.capture_failure(failure, &scope);
        match &ident {
            Some(id) => info!("Sentry exception id '{}'", id),
            None => info!("Sentry exception report for '{}' was dropped", failure),
        }
        ident
    }
}

#[async_trait]
impl ExceptionMiddleware for SentryMiddleware {
    async fn process_exception(
        &self,
        request: &Request,
        failure: &Failure,
        spider: &dyn Spider,
    ) -> ExceptionAction {
        let request = serde_json::to_value(request_to_dict(request)).unwrap_or(Value::Null);
        self.report(failure, spider, "request", request);
        ExceptionAction::Propagate
    }

    async fn process_spider_exception(
        &self,
        response: &Response,
        failure: &Failure,
        spider: &dyn Spider,
    ) -> ExceptionAction {
        let response = serde_json::to_value(response_to_dict(response, false)).unwrap_or(Value::Null);
        self.report(failure, spider, "response", response);
        ExceptionAction::Propagate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClient;
    use crate::spider::BasicSpider;
    use serde_json::json;
    use std::collections::HashMap;
    use std::io;

    fn failure() -> Failure {
        Failure::new(io::Error::new(io::ErrorKind::Other, "timed out"))
    }

    #[tokio::test]
    async fn test_request_exception_is_reported_and_propagated() {
        let client = Arc::new(MockClient::new());
        let middleware = SentryMiddleware::with_client(client.clone());
        let spider = BasicSpider::new("quotes");
        let request = Request::get("http://x/").unwrap();

        let action = middleware
            .process_exception(&request, &failure(), &spider)
            .await;
        assert_eq!(action, ExceptionAction::Propagate);

        let reports = client.reports();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_error);
        assert_eq!(reports[0].scope.extra.get("spider").unwrap(), &json!("quotes"));
        assert_eq!(
            reports[0].scope.extra.get("request").unwrap()["url"],
            json!("http://x/")
        );
    }

    #[tokio::test]
    async fn test_spider_exception_is_reported_and_propagated() {
        let client = Arc::new(MockClient::new());
        let middleware = SentryMiddleware::with_client(client.clone());
        let spider = BasicSpider::new("quotes");
        let request = Request::get("http://x/").unwrap();
        let response = Response::new(request, 200, HashMap::new(), b"ok".to_vec());

        let action = middleware
            .process_spider_exception(&response, &failure(), &spider)
            .await;
        assert_eq!(action, ExceptionAction::Propagate);

        let reports = client.reports();
        assert_eq!(reports.len(), 1);
        let extra = &reports[0].scope.extra;
        assert_eq!(extra.get("response").unwrap()["status"], json!(200));
        // Minimal context only: the response snapshot omits its request.
        assert!(extra.get("response").unwrap().get("request").is_none());
    }

    #[tokio::test]
    async fn test_hooks_propagate_even_when_backend_is_down() {
        let client = Arc::new(MockClient::unreachable());
        let middleware = SentryMiddleware::with_client(client);
        let spider = BasicSpider::new("quotes");
        let request = Request::get("http://x/").unwrap();
        let response = Response::new(request.clone(), 200, HashMap::new(), Vec::new());

        assert_eq!(
            middleware
                .process_exception(&request, &failure(), &spider)
                .await,
            ExceptionAction::Propagate
        );
        assert_eq!(
            middleware
                .process_spider_exception(&response, &failure(), &spider)
                .await,
            ExceptionAction::Propagate
        );
    }
}
