//! Wires the Sentry forwarders into a signal bus and fires a few lifecycle
//! signals. With a real DSN exported the reports land in Sentry:
//!
//! ```text
//! SENTRY_DSN=https://key@o0.ingest.sentry.io/0 cargo run --example sentry_reporting
//! ```
//!
//! Without one, the demo falls back to the recording mock client and prints
//! what would have been sent.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use serde_json::json;

use scrapy_rs_sentry::mock::MockClient;
use scrapy_rs_sentry::{
    BasicSpider, Error, ErrorForwarder, Failure, Request, Response, Result, Settings, Signal,
    SignalArgs, SignalForwarder, SignalManager, Spider,
};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let settings = Settings::new()
        .with_setting("SENTRY_SIGNALS", json!(["spider_opened", "spider_closed"]));
    let signals = SignalManager::new();

    // Keep a handle on the mock so its recordings can be printed at the end.
    let mut mock: Option<Arc<MockClient>> = None;

    match SignalForwarder::from_settings(&settings, &signals).await {
        Ok(_forwarder) => {
            // Separate settings: the error forwarder defaults to the
            // spider-error signal when no signal list is configured.
            ErrorForwarder::from_settings(&Settings::new(), &signals).await?;
            log::info!("Reporting to Sentry");
        }
        Err(Error::NotConfigured(reason)) => {
            log::warn!("Falling back to the mock client: {}", reason);
            let client = Arc::new(MockClient::new());

            let forwarder = SignalForwarder::with_client(client.clone());
            forwarder
                .subscribe(&signals, &[Signal::SpiderOpened, Signal::SpiderClosed])
                .await?;

            let errors = Arc::new(ErrorForwarder::with_client(client.clone()));
            errors.subscribe(&signals, &[Signal::SpiderError]).await?;

            mock = Some(client);
        }
        Err(e) => return Err(e),
    }

    // A short pretend crawl.
    let spider: Arc<dyn Spider> = Arc::new(BasicSpider::new("quotes"));
    signals
        .send_catch_log(Signal::SpiderOpened, SignalArgs::Spider(spider.clone()))
        .await;

    let request = Request::get("https://quotes.example.com/page/1")?;
    let response = Response::new(request, 503, HashMap::new(), b"upstream down".to_vec());
    signals
        .send_catch_log(
            Signal::SpiderError,
            SignalArgs::Error {
                failure: Failure::new(io::Error::new(io::ErrorKind::Other, "server error: 503"))
                    .with_traceback("at parse()\nat handle_response()"),
                response: Some(response),
                spider: Some(spider.clone()),
            },
        )
        .await;

    signals
        .send_catch_log(Signal::SpiderClosed, SignalArgs::Spider(spider))
        .await;

    if let Some(client) = mock {
        for report in client.reports() {
            let kind = if report.is_error { "exception" } else { "message" };
            println!("[{}] {} ({})", report.scope.level, report.message, kind);
            for (key, value) in &report.scope.extra {
                println!("    {}: {}", key, value);
            }
        }
    }

    Ok(())
}
