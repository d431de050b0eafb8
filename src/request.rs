use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    DELETE,
    HEAD,
    OPTIONS,
    PATCH,
}

/// An HTTP request made by the crawler, as seen by the reporting extension
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// The URL to request
    pub url: Url,

    /// The HTTP method to use
    #[serde(default)]
    pub method: Method,

    /// HTTP headers to include
    #[serde(default)]
    pub headers: HashMap<String, Vec<String>>,

    /// Request body (for POST, PUT, etc.)
    #[serde(default)]
    pub body: Option<Vec<u8>>,

    /// Metadata associated with this request
    #[serde(default)]
    pub meta: HashMap<String, serde_json::Value>,
}

impl Request {
    /// Create a new GET request
    pub fn get<U: AsRef<str>>(url: U) -> Result<Self> {
        let url = Url::parse(url.as_ref()).map_err(Error::UrlParseError)?;
        Ok(Self {
            url,
            method: Method::GET,
            headers: HashMap::new(),
            body: None,
            meta: HashMap::new(),
        })
    }

    /// Create a new POST request
    pub fn post<U: AsRef<str>, B: Into<Vec<u8>>>(url: U, body: B) -> Result<Self> {
        let url = Url::parse(url.as_ref()).map_err(Error::UrlParseError)?;
        Ok(Self {
            url,
            method: Method::POST,
            headers: HashMap::new(),
            body: Some(body.into()),
            meta: HashMap::new(),
        })
    }

    /// Add a header value to the request
    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Add metadata to the request
    pub fn with_meta<K: Into<String>, V: Into<serde_json::Value>>(
        mut self,
        key: K,
        value: V,
    ) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}
