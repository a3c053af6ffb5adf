//! Message route handling
//!
//! Transport-independent: takes a [`Request`] and produces exactly one
//! [`Response`], on every branch. The HTTP layer only adapts to and from these.

use super::order::SortOrder;
use crate::error::{CoreError, RequestError};
use crate::store::MessageStore;
use axum::body::Bytes;
use axum::extract::Query;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// The single route served. Any path containing it matches.
pub const MESSAGES_ROUTE: &str = "/classes/messages";

/// Inbound request descriptor
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Path plus query string as received
    pub url: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub body: Bytes,
}

impl Request {
    /// Build from a URI, decoding its query string. An undecodable query is
    /// treated as absent.
    pub fn new(method: Method, uri: &Uri, body: impl Into<Bytes>) -> Self {
        let query = Query::<HashMap<String, String>>::try_from_uri(uri)
            .map(|Query(q)| q)
            .unwrap_or_default();

        let url = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path())
            .to_string();

        Request {
            method,
            url,
            path: uri.path().to_string(),
            query,
            body: body.into(),
        }
    }
}

/// Outbound response: status, headers and a (possibly empty) text body
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Response {
    fn new(status: StatusCode, body: String) -> Self {
        Response {
            status,
            headers: default_headers(),
            body,
        }
    }
}

/// Headers carried by every response, errors included
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type, accept"),
    );
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("10"));
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    headers
}

/// Request handler for the message store
#[derive(Clone)]
pub struct MessageHandler {
    store: Arc<MessageStore>,
}

impl MessageHandler {
    pub fn new(store: Arc<MessageStore>) -> Self {
        MessageHandler { store }
    }

    pub async fn handle(&self, request: Request) -> Response {
        tracing::info!(
            "Serving request type {} for url {}",
            request.method,
            request.url
        );

        match self.dispatch(request).await {
            Ok((status, body)) => Response::new(status, body),
            Err(e) => {
                match &e {
                    RequestError::RouteNotFound(_) => tracing::debug!("{}", e),
                    RequestError::MalformedPayload(_) => tracing::warn!("{}", e),
                    RequestError::StorageUnavailable(_) => tracing::error!("{}", e),
                }
                Response::new(e.status(), String::new())
            }
        }
    }

    async fn dispatch(&self, request: Request) -> Result<(StatusCode, String), RequestError> {
        if !request.path.contains(MESSAGES_ROUTE) {
            return Err(RequestError::RouteNotFound(request.path));
        }

        match request.method {
            Method::GET | Method::OPTIONS => {
                let body = self.list(&request.query).await?;
                Ok((StatusCode::OK, body))
            }
            _ => {
                self.create(&request.body).await?;
                Ok((StatusCode::CREATED, String::new()))
            }
        }
    }

    async fn list(&self, query: &HashMap<String, String>) -> Result<String, RequestError> {
        let mut doc = self.store.load().await;

        if let Some(order) = query.get("order").and_then(|o| SortOrder::parse(o)) {
            order.apply(&mut doc.results);
        }

        Ok(serde_json::to_string(&doc).map_err(CoreError::from)?)
    }

    async fn create(&self, body: &[u8]) -> Result<(), RequestError> {
        let fields = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => {
                return Err(RequestError::MalformedPayload(
                    "message must be a JSON object".to_string(),
                ))
            }
            Err(e) => return Err(RequestError::MalformedPayload(e.to_string())),
        };

        let message = self.store.append(fields).await?;
        tracing::debug!("Stored message {:?}", message.object_id());

        Ok(())
    }
}
