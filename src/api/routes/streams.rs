//! Stream registry and publish endpoints

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::api::types::ApiError;
use crate::broker::Broker;

#[derive(Serialize)]
pub struct StreamEntry {
    name: String,
}

pub async fn list_streams(State(broker): State<Arc<Broker>>) -> impl IntoResponse {
    let streams: Vec<StreamEntry> = broker
        .list_streams()
        .into_iter()
        .map(|name| StreamEntry { name })
        .collect();
    Json(streams)
}

pub async fn create_stream(
    State(broker): State<Arc<Broker>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    if broker.create_stream(&name) {
        Ok(StatusCode::CREATED)
    } else {
        Err(ApiError::conflict(
            "STREAM_EXISTS",
            format!("stream `{name}` already exists"),
        ))
    }
}

pub async fn delete_stream(
    State(broker): State<Arc<Broker>>,
    Path(name): Path<String>,
) -> StatusCode {
    broker.delete_stream(&name);
    StatusCode::OK
}

/// Publish a JSON payload to `name`. Malformed JSON bodies are
/// rejected with 400 by the `Json` extractor before this handler
/// runs. Publishing to a stream that does not exist is a silent
/// no-op — there is no ack channel on publish.
pub async fn publish(
    State(broker): State<Arc<Broker>>,
    Path(name): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> StatusCode {
    let msg = broker.new_message(&name, payload);
    broker.notify_message(msg);
    StatusCode::OK
}
