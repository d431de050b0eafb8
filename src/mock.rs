//! Recording reporting client for tests and demos.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::client::{EventId, ReportingClient};
use crate::failure::Failure;
use crate::scope::Scope;

/// A report recorded by [`MockClient`]
#[derive(Debug, Clone)]
pub struct CapturedReport {
    /// The message text, or the failure's display form
    pub message: String,

    /// Whether this was a captured exception rather than a message
    pub is_error: bool,

    /// The scope attached to the report
    pub scope: Scope,
}

/// A reporting client that records submissions in memory
pub struct MockClient {
    reports: Mutex<Vec<CapturedReport>>,
    reachable: bool,
    next_id: AtomicU64,
}

impl MockClient {
    /// Create a new mock client that accepts every submission
    pub fn new() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
            reachable: true,
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a mock client that simulates an unreachable backend: every
    /// submission is dropped and yields no event id
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Snapshot of the reports recorded so far
    pub fn reports(&self) -> Vec<CapturedReport> {
        self.reports.lock().expect("mock reports lock").clone()
    }

    fn record(&self, message: String, is_error: bool, scope: &Scope) -> Option<EventId> {
        if !self.reachable {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.reports.lock().expect("mock reports lock").push(CapturedReport {
            message,
            is_error,
            scope: scope.clone(),
        });
        Some(EventId::new(format!("mock-{}", id)))
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportingClient for MockClient {
    fn capture_message(&self, message: &str, scope: &Scope) -> Option<EventId> {
        self.record(message.to_string(), false, scope)
    }

    fn capture_failure(&self, failure: &Failure, scope: &Scope) -> Option<EventId> {
        self.record(failure.to_string(), true, scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_mock_records_in_order() {
        let client = MockClient::new();
        let scope = Scope::new();

        let first = client.capture_message("one", &scope).unwrap();
        let second = client
            .capture_failure(&Failure::new(io::Error::new(io::ErrorKind::Other, "two")), &scope)
            .unwrap();

        assert_ne!(first, second);
        let reports = client.reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].message, "one");
        assert!(!reports[0].is_error);
        assert_eq!(reports[1].message, "two");
        assert!(reports[1].is_error);
    }

    #[test]
    fn test_unreachable_mock_drops_everything() {
        let client = MockClient::unreachable();
        assert!(client.capture_message("lost", &Scope::new()).is_none());
        assert!(client.reports().is_empty());
    }
}
