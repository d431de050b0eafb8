use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use serde_json::json;

use scrapy_rs_sentry::mock::MockClient;
use scrapy_rs_sentry::{
    BasicSpider, Error, ExceptionAction, ExceptionMiddleware, Failure, Request, Response,
    SentryMiddleware, Settings,
};

fn failure() -> Failure {
    Failure::new(io::Error::new(io::ErrorKind::Other, "connection reset"))
        .with_traceback("at download()")
}

#[tokio::test]
async fn middleware_requires_a_dsn() {
    std::env::remove_var("SENTRY_DSN");
    assert!(matches!(
        SentryMiddleware::from_settings(&Settings::new()),
        Err(Error::NotConfigured(_))
    ));
}

#[tokio::test]
async fn middleware_reports_through_the_trait_object() {
    let client = Arc::new(MockClient::new());
    let middleware: Box<dyn ExceptionMiddleware> =
        Box::new(SentryMiddleware::with_client(client.clone()));
    let spider = BasicSpider::new("quotes");

    let request = Request::get("http://x/a").unwrap();
    let action = middleware
        .process_exception(&request, &failure(), &spider)
        .await;
    assert_eq!(action, ExceptionAction::Propagate);

    let response = Response::new(
        Request::get("http://x/b").unwrap(),
        500,
        HashMap::new(),
        Vec::new(),
    );
    let action = middleware
        .process_spider_exception(&response, &failure(), &spider)
        .await;
    assert_eq!(action, ExceptionAction::Propagate);

    let reports = client.reports();
    assert_eq!(reports.len(), 2);
    assert_eq!(
        reports[0].scope.extra.get("request").unwrap()["url"],
        json!("http://x/a")
    );
    assert_eq!(
        reports[1].scope.extra.get("response").unwrap()["url"],
        json!("http://x/b")
    );
    for report in &reports {
        assert!(report.is_error);
        assert_eq!(report.message, "connection reset");
        assert_eq!(report.scope.extra.get("spider").unwrap(), &json!("quotes"));
        assert_eq!(
            report.scope.extra.get("traceback").unwrap(),
            &json!("at download()")
        );
    }
}

#[tokio::test]
async fn middleware_never_suppresses_when_backend_is_down() {
    let client = Arc::new(MockClient::unreachable());
    let middleware = SentryMiddleware::with_client(client.clone());
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
    assert!(client.reports().is_empty());
}
