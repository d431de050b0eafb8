use std::borrow::Cow;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::request::Request;

/// An HTTP response received by the crawler, as seen by the reporting extension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// The URL of the response
    pub url: Url,

    /// The HTTP status code
    pub status: u16,

    /// HTTP headers received
    pub headers: HashMap<String, Vec<String>>,

    /// Response body
    pub body: Vec<u8>,

    /// The request that generated this response
    pub request: Request,

    /// Metadata associated with this response
    #[serde(default)]
    pub meta: HashMap<String, serde_json::Value>,
}

impl Response {
    /// Create a new response
    pub fn new(
        request: Request,
        status: u16,
        headers: HashMap<String, Vec<String>>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            url: request.url.clone(),
            status,
            headers,
            body,
            request,
            meta: HashMap::new(),
        }
    }

    /// Get the response body as text, replacing invalid UTF-8
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Check if the response was successful (status code 200-299)
    pub fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_url_comes_from_request() {
        let request = Request::get("https://example.com/page").unwrap();
        let response = Response::new(request, 200, HashMap::new(), Vec::new());
        assert_eq!(response.url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_response_text() {
        let request = Request::get("https://example.com").unwrap();
        let response = Response::new(request, 200, HashMap::new(), b"Hello, world!".to_vec());
        assert_eq!(response.text(), "Hello, world!");
    }

    #[test]
    fn test_response_is_success() {
        let request = Request::get("https://example.com").unwrap();
        let response = Response::new(request.clone(), 200, HashMap::new(), Vec::new());
        assert!(response.is_success());

        let response = Response::new(request, 404, HashMap::new(), Vec::new());
        assert!(!response.is_success());
    }
}
