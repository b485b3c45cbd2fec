//! Shared utilities for integration tests.

use std::convert::Infallible;
use std::time::Duration;

use axum::body::Body;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use fakehttp::Hub;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Number of events the `/events` route emits.
pub const EVENT_COUNT: u32 = 4;

/// Size of the `/large` response body.
pub const LARGE_BODY_LEN: usize = 256 * 1024;

/// Background axum server bound to a hub's listener.
///
/// Dropping it signals graceful shutdown, so the serve loop ends even
/// though a closed listener never yields another connection.
pub struct TestServer {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Stop accepting and wait for the serve loop to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Serve `router` on the hub's listener in the background.
pub fn serve(hub: &Hub, router: Router) -> TestServer {
    fakehttp::observability::logging::init();
    let listener = hub.listener();
    let (tx, rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let shutdown = async move {
            let _ = rx.await;
        };
        if let Err(err) = axum::serve(listener, router).with_graceful_shutdown(shutdown).await {
            tracing::error!(error = %err, "Test server failed");
        }
        tracing::debug!("Test server stopped");
    });
    TestServer {
        shutdown: Some(tx),
        task: Some(task),
    }
}

/// Routes used across the integration tests.
pub fn test_router() -> Router {
    Router::new()
        .route("/hello", get(|| async { "Hello World" }))
        .route("/echo", axum::routing::post(|body: String| async move { body }))
        .route("/large", get(|| async { vec![b'x'; LARGE_BODY_LEN] }))
        .route("/events", get(events))
}

/// A slow event stream, one `data:` frame at a time.
async fn events() -> impl IntoResponse {
    let stream = futures_util::stream::unfold(0u32, |i| async move {
        if i == EVENT_COUNT {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
        Some((Ok::<_, Infallible>(format!("data: event-{i}\n\n")), i + 1))
    });

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
}
