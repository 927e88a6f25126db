//! Response envelope and helpers shared by the resource routes

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::http::error::ApiError;

/// `{statusCode, message}`: body of every write response and every error
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMessage {
    pub status_code: u16,
    pub message: String,
}

impl StatusMessage {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
        }
    }
}

/// Map a repository commit result onto the envelope: `true` is a 200 with
/// `success`, `false` a 500 with `failure`.
pub fn committed(
    saved: bool,
    success: &'static str,
    failure: &'static str,
) -> Result<Json<StatusMessage>, ApiError> {
    if !saved {
        return Err(ApiError::Persistence { message: failure });
    }
    Ok(Json(StatusMessage::new(StatusCode::OK, success)))
}

/// Related collections are a 404 when empty.
pub fn non_empty<T, D>(
    rows: Vec<T>,
    resource: &'static str,
    id: i32,
) -> Result<Json<Vec<D>>, ApiError>
where
    D: From<T>,
{
    if rows.is_empty() {
        return Err(ApiError::not_found(resource, id));
    }
    Ok(Json(rows.into_iter().map(D::from).collect()))
}
