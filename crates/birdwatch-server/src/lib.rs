//! # birdwatch-server
//!
//! The HTTP admission surface over the queue and observer: `POST`/`GET
//! /bird`, `GET /metrics`, and the `/_liveness`/`/_readiness` health
//! endpoints every birdwatch service exposes.

mod handlers;
mod middleware;
mod router;
mod state;

pub use router::build_router;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{self, Request, StatusCode};
    use birdwatch_core::Config;
    use birdwatch_observer::Observer;
    use birdwatch_queue::Queue;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> (tempfile::TempDir, tempfile::TempDir, AppState) {
        let queue_dir = tempfile::tempdir().unwrap();
        let observer_dir = tempfile::tempdir().unwrap();
        let queue = Queue::open(queue_dir.path(), 13).unwrap();
        let observer = Observer::open(observer_dir.path(), 13, 3 * 60 * 60 * 1000, 0.5).unwrap();
        let config = Arc::new(Config {
            port: 0,
            queue_db_path: String::new(),
            observer_db_path: String::new(),
            poll_interval_ms: 250,
            base_delay_ms: 1000,
            max_retries: 5,
            default_metrics_window_ms: 3 * 60 * 60 * 1000,
            failure_rate_threshold: 0.5,
            timestamp_pad_length: 13,
            worker_concurrency: 4,
        });
        (
            queue_dir,
            observer_dir,
            AppState {
                queue,
                observer,
                config,
            },
        )
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn post_bird_creates_then_deduplicates() {
        let (_qd, _od, state) = test_state();
        let app = build_router(state);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(http::Method::POST)
                    .uri("/bird")
                    .header(http::header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name": "Kea"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["status"], "queued");

        let response = app
            .oneshot(
                Request::builder()
                    .method(http::Method::POST)
                    .uri("/bird")
                    .header(http::header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"name": "Kea"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn post_bird_rejects_missing_name() {
        let (_qd, _od, state) = test_state();
        let app = build_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method(http::Method::POST)
                    .uri("/bird")
                    .header(http::header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_bird_404s_until_completed() {
        let (_qd, _od, state) = test_state();
        state.queue.submit("Tui").await.unwrap();
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/bird?name=Tui")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let claimed = state.queue.claim().await.unwrap().unwrap();
        state
            .queue
            .complete(&claimed.id, serde_json::json!({"research": "hi"}))
            .await
            .unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/bird?name=Tui")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["body"]["research"], "hi");
    }

    #[tokio::test]
    async fn get_metrics_returns_shape() {
        let (_qd, _od, state) = test_state();
        let app = build_router(state);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["failureRate"], 0.0);
        assert!(body["avgProcessingTimeMs"].is_null());
    }

    #[tokio::test]
    async fn liveness_and_readiness_report_ok() {
        let (_qd, _od, state) = test_state();
        let app = build_router(state);

        for path in ["/_liveness", "/_readiness"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
