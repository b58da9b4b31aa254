//! Consumer group registry endpoints

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::api::types::ApiError;
use crate::broker::Broker;

#[derive(Serialize)]
pub struct ConsumerEntry {
    id: u64,
}

#[derive(Serialize)]
pub struct GroupInfoResponse {
    consumers: Vec<ConsumerEntry>,
}

pub async fn create_group(
    State(broker): State<Arc<Broker>>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    if broker.create_group(&name) {
        Ok(StatusCode::CREATED)
    } else {
        Err(ApiError::conflict(
            "GROUP_EXISTS",
            format!("group `{name}` already exists"),
        ))
    }
}

pub async fn get_group(
    State(broker): State<Arc<Broker>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let consumers = broker
        .get_consumer_group_info(&name)?
        .into_iter()
        .map(|c| ConsumerEntry { id: c.id })
        .collect();
    Ok(Json(GroupInfoResponse { consumers }))
}

pub async fn delete_group(
    State(broker): State<Arc<Broker>>,
    Path(name): Path<String>,
) -> StatusCode {
    broker.delete_group(&name);
    StatusCode::OK
}
