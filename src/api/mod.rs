//! HTTP API module for Chatstore
//!
//! A single fallback service adapts every inbound request into the message
//! handler, so routing and 404s are decided in one place.

use crate::error::{CoreError, Result};
use crate::handlers::{MessageHandler, Request};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{Method, Uri},
    response::IntoResponse,
    Router,
};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub handler: MessageHandler,
}

/// Start the HTTP API server
pub async fn serve(addr: SocketAddr, handler: MessageHandler) -> Result<()> {
    let app = create_router(AppState { handler });

    // A successful connect means something already owns the port
    if tokio::net::TcpStream::connect(addr).await.is_ok() {
        tracing::error!(
            "Port {} is already in use; another chatstore instance may be running.",
            addr.port()
        );
        return Err(CoreError::Api(format!("Port {} already in use", addr.port())));
    }

    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| CoreError::Api(e.to_string()))?;

    Ok(())
}

/// Create the API router.
///
/// Bodies are not size-capped here, so every POST reaches the handler and
/// every response carries the handler's headers.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> axum::response::Response {
    let response = state.handler.handle(Request::new(method, &uri, body)).await;
    (response.status, response.headers, response.body).into_response()
}

/// Resolves on Ctrl+C, or SIGTERM on unix, letting in-flight requests finish.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Ctrl+C listener unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM listener unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }

    tracing::info!("Stopping chatstore, draining open requests");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MessageStore;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        create_router(AppState {
            handler: MessageHandler::new(Arc::new(MessageStore::memory())),
        })
    }

    async fn send(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_post_and_get_over_http() {
        let app = app();

        let (status, body) = send(
            &app,
            "POST",
            "/classes/messages",
            r#"{"username":"Jono","message":"Do my bidding!"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.is_empty());

        let (status, body) = send(&app, "GET", "/classes/messages", "").await;
        assert_eq!(status, StatusCode::OK);
        let parsed: Value = serde_json::from_str(&body).unwrap();
        let results = parsed["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["username"], "Jono");
        assert_eq!(results[0]["message"], "Do my bidding!");
        assert!(results[0].get("createdAt").is_some());
        assert!(results[0].get("updatedAt").is_some());
    }

    #[tokio::test]
    async fn test_reverse_order_query_over_http() {
        let app = app();
        for text in ["first message", "second message", "third message"] {
            let body = json!({"username": "Jono", "message": text}).to_string();
            send(&app, "POST", "/classes/messages", &body).await;
        }

        let (_, body) = send(&app, "GET", "/classes/messages?order=-objectId", "").await;
        let parsed: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["results"][0]["message"], "third message");
        assert_eq!(parsed["results"][2]["message"], "first message");
    }

    #[tokio::test]
    async fn test_unknown_path_is_404_with_headers() {
        let request = HttpRequest::builder()
            .uri("/arglebargle")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["content-type"], "text/plain");
    }

    #[tokio::test]
    async fn test_preflight_gets_cors_headers() {
        let request = HttpRequest::builder()
            .method("OPTIONS")
            .uri("/classes/messages")
            .header("origin", "http://localhost:8080")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["access-control-allow-methods"],
            "GET, POST, PUT, DELETE, OPTIONS"
        );
        assert_eq!(response.headers()["access-control-max-age"], "10");
    }

    #[tokio::test]
    async fn test_large_post_reaches_the_handler() {
        let handler = MessageHandler::new(Arc::new(MessageStore::memory()));
        let app = create_router(AppState {
            handler: handler.clone(),
        });
        let text = "x".repeat(3 * 1024 * 1024);
        let body = json!({ "message": text }).to_string();

        let request = HttpRequest::builder()
            .method("POST")
            .uri("/classes/messages")
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert_eq!(response.headers()["content-type"], "text/plain");

        let uri = "/classes/messages".parse().unwrap();
        let listed = handler.handle(Request::new(Method::GET, &uri, "")).await;
        let parsed: Value = serde_json::from_str(&listed.body).unwrap();
        assert_eq!(parsed["results"][0]["message"].as_str().map(str::len), Some(text.len()));
    }

    #[tokio::test]
    async fn test_malformed_post_over_http() {
        let (status, body) = send(&app(), "POST", "/classes/messages", "{oops").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
    }
}
