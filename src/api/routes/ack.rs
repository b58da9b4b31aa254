//! Acknowledgement endpoint

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;

use crate::api::types::ApiError;
use crate::broker::Broker;

/// Acks are keyed by stream name with a list of message ids. A
/// malformed body is a 500 here (not 400, unlike publish) — this
/// endpoint's wire contract intentionally differs from the publish
/// endpoint's.
pub async fn ack(
    State(broker): State<Arc<Broker>>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let group = params.get("cgroup").cloned().unwrap_or_default();
    let acks: HashMap<String, Vec<String>> = serde_json::from_slice(&body)
        .map_err(|err| ApiError::internal(format!("malformed ack body: {err}")))?;

    broker.ack_messages(&group, &acks)?;
    Ok(StatusCode::OK)
}
