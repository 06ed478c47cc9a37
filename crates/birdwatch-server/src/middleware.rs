use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use birdwatch_core::{ActionKind, Severity};
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

/// Requests larger than this are logged with a placeholder body rather than
/// buffered in full.
const MAX_LOGGED_BODY_BYTES: usize = 64 * 1024;

/// Logs every request as an `api-request` observer event before handing it
/// to the rest of the router. The body is buffered here and reassembled
/// into the request so downstream extractors still see it.
pub async fn log_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().unwrap_or("").to_string();

    let (parts, body) = req.into_parts();
    let body_value = match to_bytes(body, MAX_LOGGED_BODY_BYTES).await {
        Ok(bytes) => {
            let value = serde_json::from_slice::<Value>(&bytes).unwrap_or(Value::Null);
            let req = Request::from_parts(parts, Body::from(bytes));
            if let Err(e) = state
                .observer
                .log(
                    ActionKind::ApiRequest,
                    Severity::Log,
                    json!({"method": method, "path": path, "query": query, "body": value}),
                )
                .await
            {
                warn!(error = %e, "failed to log api-request event");
            }
            return next.run(req).await;
        }
        Err(_) => json!({"error": "body too large to buffer"}),
    };

    if let Err(e) = state
        .observer
        .log(
            ActionKind::ApiRequest,
            Severity::Log,
            json!({"method": method, "path": path, "query": query, "body": body_value}),
        )
        .await
    {
        warn!(error = %e, "failed to log api-request event");
    }

    // Body could not be buffered; forward the original parts with an empty
    // body rather than failing the request outright.
    next.run(Request::from_parts(parts, Body::empty())).await
}
