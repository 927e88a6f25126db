//! Review endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::common::{committed, StatusMessage};
use super::pokemon::{list_pokemon_reviews, PokemonDto};
use crate::db::{Review, ReviewContent};
use crate::http::error::ApiError;
use crate::http::extractors::{TargetId, ValidId, ValidJson};
use crate::http::server::AppState;
use crate::models::{Text, ValidationError, MAX_BODY_LEN, MAX_TITLE_LEN};

/// Review response; `pokemon` is present when it was loaded
#[derive(Debug, Serialize)]
pub struct ReviewDto {
    pub id: i32,
    pub title: String,
    pub text: String,
    pub rating: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pokemon: Option<PokemonDto>,
}

impl From<Review> for ReviewDto {
    fn from(r: Review) -> Self {
        Self {
            id: r.id,
            title: r.title,
            text: r.text,
            rating: r.rating,
            pokemon: r.pokemon.map(PokemonDto::from),
        }
    }
}

fn content(title: &str, text: &str, rating: i32) -> Result<ReviewContent, ValidationError> {
    Ok(ReviewContent {
        title: Text::new("title", title, MAX_TITLE_LEN)?,
        text: Text::new("text", text, MAX_BODY_LEN)?,
        rating,
    })
}

/// Create review request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewForm {
    pub title: String,
    pub text: String,
    pub rating: i32,
    pub reviewer_id: i32,
    pub pokemon_id: i32,
}

/// Edit review request; the pokemon and reviewer of a review never change
#[derive(Deserialize)]
pub struct EditReviewForm {
    pub title: String,
    pub text: String,
    pub rating: i32,
}

/// GET /api/review - reviews with their pokemon
async fn list_reviews(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ReviewDto>>, ApiError> {
    let rows = state.reviews.list().await?;
    Ok(Json(rows.into_iter().map(ReviewDto::from).collect()))
}

async fn get_review(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<ReviewDto>, ApiError> {
    let review = state
        .reviews
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("review", id))?;
    Ok(Json(ReviewDto::from(review)))
}

async fn create_review(
    State(state): State<Arc<AppState>>,
    ValidJson(form): ValidJson<CreateReviewForm>,
) -> Result<Json<StatusMessage>, ApiError> {
    let review = content(&form.title, &form.text, form.rating)?;
    let (pokemon_id, reviewer_id) = (form.pokemon_id, form.reviewer_id);

    if !state.pokemon.exists(pokemon_id).await? {
        return Err(ApiError::unprocessable(
            "There is no pokemon associated with this pokemonId.",
        ));
    }
    if !state.reviewers.exists(reviewer_id).await? {
        return Err(ApiError::unprocessable(
            "There is no reviewer associated with this reviewerId.",
        ));
    }

    committed(
        state.reviews.create(&review, pokemon_id, reviewer_id).await?,
        "Successfully created the review.",
        "Failed to create the review.",
    )
}

async fn update_review(
    State(state): State<Arc<AppState>>,
    TargetId(id): TargetId,
    ValidJson(form): ValidJson<EditReviewForm>,
) -> Result<Json<StatusMessage>, ApiError> {
    let review = content(&form.title, &form.text, form.rating)?;
    if !state.reviews.exists(id).await? {
        return Err(ApiError::not_found("review", id));
    }

    committed(
        state.reviews.update(id, &review).await?,
        "Successfully updated the review.",
        "Failed to update the review.",
    )
}

async fn delete_review(
    State(state): State<Arc<AppState>>,
    TargetId(id): TargetId,
) -> Result<Json<StatusMessage>, ApiError> {
    if !state.reviews.exists(id).await? {
        return Err(ApiError::not_found("review", id));
    }

    committed(
        state.reviews.delete(id).await?,
        "Successfully deleted the review.",
        "Failed to delete the review.",
    )
}

/// Review routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/review",
            get(list_reviews)
                .post(create_review)
                .put(update_review)
                .delete(delete_review),
        )
        .route("/api/review/{id}", get(get_review))
        .route("/api/review/pokemon/{id}", get(list_pokemon_reviews))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_length_is_bounded() {
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(matches!(
            content(&long, "fine", 5),
            Err(ValidationError::TooLong { field: "title", .. })
        ));
        assert!(content("Fine", "fine", 5).is_ok());
    }
}
