//! Reviewer endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::common::{committed, non_empty, StatusMessage};
use super::reviews::ReviewDto;
use crate::db::{Reviewer, ReviewerInput};
use crate::http::error::ApiError;
use crate::http::extractors::{TargetId, ValidId, ValidJson};
use crate::http::server::AppState;
use crate::models::{Text, ValidationError};

/// Reviewer response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerDto {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
}

impl From<Reviewer> for ReviewerDto {
    fn from(r: Reviewer) -> Self {
        Self {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
        }
    }
}

/// Create/edit reviewer request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewerForm {
    pub first_name: String,
    pub last_name: String,
}

impl ReviewerForm {
    fn validate(self) -> Result<ReviewerInput, ValidationError> {
        Ok(ReviewerInput {
            first_name: Text::name("firstName", &self.first_name)?,
            last_name: Text::name("lastName", &self.last_name)?,
        })
    }
}

async fn list_reviewers(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ReviewerDto>>, ApiError> {
    let rows = state.reviewers.list().await?;
    Ok(Json(rows.into_iter().map(ReviewerDto::from).collect()))
}

async fn get_reviewer(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<ReviewerDto>, ApiError> {
    let reviewer = state
        .reviewers
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("reviewer", id))?;
    Ok(Json(ReviewerDto::from(reviewer)))
}

/// GET /api/reviewer/{id}/reviews
async fn list_reviewer_reviews(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<Vec<ReviewDto>>, ApiError> {
    let rows = state.reviewers.list_reviews(id).await?;
    non_empty(rows, "reviews for reviewer", id)
}

async fn create_reviewer(
    State(state): State<Arc<AppState>>,
    ValidJson(form): ValidJson<ReviewerForm>,
) -> Result<Json<StatusMessage>, ApiError> {
    let reviewer = form.validate()?;
    committed(
        state.reviewers.create(&reviewer).await?,
        "Successfully saved the reviewer.",
        "Failed to save the reviewer.",
    )
}

async fn update_reviewer(
    State(state): State<Arc<AppState>>,
    TargetId(id): TargetId,
    ValidJson(form): ValidJson<ReviewerForm>,
) -> Result<Json<StatusMessage>, ApiError> {
    let reviewer = form.validate()?;
    if !state.reviewers.exists(id).await? {
        return Err(ApiError::not_found("reviewer", id));
    }

    committed(
        state.reviewers.update(id, &reviewer).await?,
        "Successfully updated the reviewer.",
        "Failed to update the reviewer.",
    )
}

/// DELETE /api/reviewer?id= - the reviewer's reviews go with them
async fn delete_reviewer(
    State(state): State<Arc<AppState>>,
    TargetId(id): TargetId,
) -> Result<Json<StatusMessage>, ApiError> {
    if !state.reviewers.exists(id).await? {
        return Err(ApiError::not_found("reviewer", id));
    }

    committed(
        state.reviewers.delete(id).await?,
        "Successfully deleted the reviewer.",
        "Failed to delete the reviewer.",
    )
}

/// Reviewer routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/reviewer",
            get(list_reviewers)
                .post(create_reviewer)
                .put(update_reviewer)
                .delete(delete_reviewer),
        )
        .route("/api/reviewer/{id}", get(get_reviewer))
        .route("/api/reviewer/{id}/reviews", get(list_reviewer_reviews))
}
