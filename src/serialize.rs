//! Conversions between the crawler's request/response objects and the plain
//! snapshots attached to outgoing reports.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::request::{Method, Request};
use crate::response::Response;

/// Point-in-time snapshot of a request. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedRequest {
    /// The request URL
    pub url: String,

    /// The HTTP method
    pub method: Method,

    /// Request headers
    pub headers: HashMap<String, Vec<String>>,

    /// Request body, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<u8>>,

    /// Request metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub meta: HashMap<String, serde_json::Value>,
}

/// Point-in-time snapshot of a response, optionally carrying the originating
/// request. Immutable once constructed; exists for the duration of one
/// report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedResponse {
    /// Seconds since the UNIX epoch at serialization time
    pub time: f64,

    /// The HTTP status code
    pub status: u16,

    /// The response URL
    pub url: String,

    /// Response headers
    pub headers: HashMap<String, Vec<String>>,

    /// Response body
    pub body: Vec<u8>,

    /// The originating request, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<SerializedRequest>,
}

/// Returns a snapshot of a request
pub fn request_to_dict(request: &Request) -> SerializedRequest {
    SerializedRequest {
        url: request.url.to_string(),
        method: request.method,
        headers: request.headers.clone(),
        body: request.body.clone(),
        meta: request.meta.clone(),
    }
}

/// Returns a snapshot of a response. With `include_request` the originating
/// request is serialized into the snapshot as well; otherwise the request
/// field is omitted entirely.
pub fn response_to_dict(response: &Response, include_request: bool) -> SerializedResponse {
    let time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();

    SerializedResponse {
        time,
        status: response.status,
        url: response.url.to_string(),
        headers: response.headers.clone(),
        body: response.body.clone(),
        request: include_request.then(|| request_to_dict(&response.request)),
    }
}

impl SerializedRequest {
    /// Rebuild a crawler request from this snapshot
    pub fn into_request(self) -> Result<Request> {
        let url = Url::parse(&self.url).map_err(Error::UrlParseError)?;
        Ok(Request {
            url,
            method: self.method,
            headers: self.headers,
            body: self.body,
            meta: self.meta,
        })
    }
}

impl SerializedResponse {
    /// Rebuild a crawler response from this snapshot. When the snapshot
    /// carries no request, a bare GET for the response URL stands in.
    pub fn into_response(self) -> Result<Response> {
        let url = Url::parse(&self.url).map_err(Error::UrlParseError)?;
        let request = match self.request {
            Some(request) => request.into_request()?,
            None => Request::get(url.as_str())?,
        };
        let mut response = Response::new(request, self.status, self.headers, self.body);
        response.url = url;
        Ok(response)
    }
}
