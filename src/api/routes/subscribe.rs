//! Long-lived subscription endpoint: newline-delimited JSON messages

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

use crate::api::types::ApiError;
use crate::broker::Broker;
use crate::core::constants::CONSUMER_QUEUE_CAPACITY;

/// An empty or absent `cgroup` creates a fresh anonymous one-consumer
/// group per subscription, so anonymous subscribers broadcast to one
/// another.
pub async fn subscribe(
    State(broker): State<Arc<Broker>>,
    Path(stream): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let group = match params.get("cgroup").map(String::as_str) {
        Some(g) if !g.is_empty() => g.to_string(),
        _ => format!("anon-{}", uuid::Uuid::new_v4()),
    };

    let (sink, rx) = tokio::sync::mpsc::channel::<Vec<u8>>(CONSUMER_QUEUE_CAPACITY);
    let handle = broker.register_consumer(&group, sink, std::slice::from_ref(&stream))?;

    let broker = broker.clone();
    tokio::spawn(async move {
        handle.join().await;
        broker.unregister_consumer(&handle.group, handle.id);
    });

    let body = Body::from_stream(ReceiverStream::new(rx).map(Ok::<_, Infallible>));

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(body)
        .expect("response builder with well-formed headers never fails"))
}
