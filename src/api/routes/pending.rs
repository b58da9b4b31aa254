//! Pending (dispatched-but-unacknowledged) message listing

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Serialize;

use crate::api::types::ApiError;
use crate::broker::Broker;

#[derive(Serialize)]
pub struct PendingEntryResponse {
    id: String,
    timestamp: u64,
}

pub async fn list_pending(
    State(broker): State<Arc<Broker>>,
    Path(stream): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, ApiError> {
    let group = params.get("cgroup").cloned().unwrap_or_default();
    let entries: Vec<PendingEntryResponse> = broker
        .list_pending(&stream, &group)?
        .into_iter()
        .map(|p| PendingEntryResponse {
            id: p.id,
            timestamp: p.timestamp,
        })
        .collect();
    Ok(Json(entries))
}
