//! Category endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::common::{committed, non_empty, StatusMessage};
use super::pokemon::PokemonDto;
use crate::db::Category;
use crate::http::error::ApiError;
use crate::http::extractors::{TargetId, ValidId, ValidJson};
use crate::http::server::AppState;
use crate::models::Text;

/// Category response
#[derive(Debug, Serialize)]
pub struct CategoryDto {
    pub id: i32,
    pub name: String,
}

impl From<Category> for CategoryDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

/// Create/edit category request
#[derive(Deserialize)]
pub struct CategoryForm {
    pub name: String,
}

/// GET /api/category
async fn list_categories(State(state): State<Arc<AppState>>) -> Result<Json<Vec<CategoryDto>>, ApiError> {
    let rows = state.categories.list().await?;
    Ok(Json(rows.into_iter().map(CategoryDto::from).collect()))
}

/// GET /api/category/{id}
async fn get_category(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<CategoryDto>, ApiError> {
    let category = state
        .categories
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("category", id))?;
    Ok(Json(CategoryDto::from(category)))
}

/// GET /api/category/{id}/pokemon - pokemon in the category
async fn list_category_pokemon(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<Vec<PokemonDto>>, ApiError> {
    let rows = state.categories.list_pokemon(id).await?;
    non_empty(rows, "pokemon for category", id)
}

/// POST /api/category
async fn create_category(
    State(state): State<Arc<AppState>>,
    ValidJson(form): ValidJson<CategoryForm>,
) -> Result<Json<StatusMessage>, ApiError> {
    let name = Text::name("name", &form.name)?;
    if state.categories.name_exists(name.as_str()).await? {
        return Err(ApiError::unprocessable("Category already exists."));
    }

    committed(
        state.categories.create(&name).await?,
        "Successfully saved the category.",
        "Failed to save the category.",
    )
}

/// PUT /api/category?id=
async fn update_category(
    State(state): State<Arc<AppState>>,
    TargetId(id): TargetId,
    ValidJson(form): ValidJson<CategoryForm>,
) -> Result<Json<StatusMessage>, ApiError> {
    let name = Text::name("name", &form.name)?;
    if !state.categories.exists(id).await? {
        return Err(ApiError::not_found("category", id));
    }

    committed(
        state.categories.update(id, &name).await?,
        "Successfully updated the category.",
        "Failed to update the category.",
    )
}

/// DELETE /api/category?id=
async fn delete_category(
    State(state): State<Arc<AppState>>,
    TargetId(id): TargetId,
) -> Result<Json<StatusMessage>, ApiError> {
    if !state.categories.exists(id).await? {
        return Err(ApiError::not_found("category", id));
    }

    committed(
        state.categories.delete(id).await?,
        "Successfully deleted the category.",
        "Failed to delete the category.",
    )
}

/// Category routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/category",
            get(list_categories)
                .post(create_category)
                .put(update_category)
                .delete(delete_category),
        )
        .route("/api/category/{id}", get(get_category))
        .route("/api/category/{id}/pokemon", get(list_category_pokemon))
        .route("/api/category/pokemon/{id}", get(list_category_pokemon))
}
