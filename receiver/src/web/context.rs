//! Per-request value handed to the verification pipeline.
//!
//! Built once at the HTTP boundary. Nothing below the handlers reads
//! request state from anywhere else.

use std::collections::HashMap;
use std::convert::Infallible;

use axum::{
    async_trait,
    body::{to_bytes, Bytes},
    extract::{FromRequest, Query, Request},
    http::{HeaderMap, Method},
};
use tracing::warn;

/// Largest body read from the wire.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Method, path, headers, query and raw body of one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub query: HashMap<String, String>,
    /// Raw body bytes; `None` when the body could not be read in full.
    pub body: Option<Bytes>,
}

impl RequestContext {
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            path: path.into(),
            headers,
            query: HashMap::new(),
            body: Some(body.into()),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    /// Header value by case-insensitive name; empty when absent or not UTF-8.
    pub fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Query parameter value; empty when absent.
    pub fn query_param(&self, name: &str) -> &str {
        self.query.get(name).map(String::as_str).unwrap_or("")
    }
}

#[async_trait]
impl<S> FromRequest<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();

        let query = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();

        let body = match to_bytes(body, MAX_BODY_BYTES).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "request_body_read_failed");
                None
            }
        };

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            headers: parts.headers,
            query,
            body,
        })
    }
}
