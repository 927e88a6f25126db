//! Country endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::common::{committed, non_empty, StatusMessage};
use super::owners::OwnerDto;
use crate::db::Country;
use crate::http::error::ApiError;
use crate::http::extractors::{TargetId, ValidId, ValidJson};
use crate::http::server::AppState;
use crate::models::Text;

/// Country response
#[derive(Debug, Serialize)]
pub struct CountryDto {
    pub id: i32,
    pub name: String,
}

impl From<Country> for CountryDto {
    fn from(c: Country) -> Self {
        Self {
            id: c.id,
            name: c.name,
        }
    }
}

/// Create/edit country request
#[derive(Deserialize)]
pub struct CountryForm {
    pub name: String,
}

async fn list_countries(State(state): State<Arc<AppState>>) -> Result<Json<Vec<CountryDto>>, ApiError> {
    let rows = state.countries.list().await?;
    Ok(Json(rows.into_iter().map(CountryDto::from).collect()))
}

async fn get_country(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<CountryDto>, ApiError> {
    let country = state
        .countries
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("country", id))?;
    Ok(Json(CountryDto::from(country)))
}

/// GET /api/country/owner/{ownerId} - country the owner lives in
async fn get_owner_country(
    State(state): State<Arc<AppState>>,
    ValidId(owner_id): ValidId,
) -> Result<Json<CountryDto>, ApiError> {
    let country = state
        .countries
        .get_by_owner(owner_id)
        .await?
        .ok_or_else(|| ApiError::not_found("country for owner", owner_id))?;
    Ok(Json(CountryDto::from(country)))
}

/// GET /api/country/{id}/owners
async fn list_country_owners(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<Vec<OwnerDto>>, ApiError> {
    let rows = state.countries.list_owners(id).await?;
    non_empty(rows, "owners for country", id)
}

async fn create_country(
    State(state): State<Arc<AppState>>,
    ValidJson(form): ValidJson<CountryForm>,
) -> Result<Json<StatusMessage>, ApiError> {
    let name = Text::name("name", &form.name)?;
    if state.countries.name_exists(name.as_str()).await? {
        return Err(ApiError::unprocessable("Country already exists."));
    }

    committed(
        state.countries.create(&name).await?,
        "Successfully saved the country.",
        "Failed to save the country.",
    )
}

async fn update_country(
    State(state): State<Arc<AppState>>,
    TargetId(id): TargetId,
    ValidJson(form): ValidJson<CountryForm>,
) -> Result<Json<StatusMessage>, ApiError> {
    let name = Text::name("name", &form.name)?;
    if !state.countries.exists(id).await? {
        return Err(ApiError::not_found("country", id));
    }

    committed(
        state.countries.update(id, &name).await?,
        "Successfully updated the country.",
        "Failed to update the country.",
    )
}

/// DELETE /api/country?id= - also removes the country's owners
async fn delete_country(
    State(state): State<Arc<AppState>>,
    TargetId(id): TargetId,
) -> Result<Json<StatusMessage>, ApiError> {
    if !state.countries.exists(id).await? {
        return Err(ApiError::not_found("country", id));
    }

    committed(
        state.countries.delete(id).await?,
        "Successfully deleted the country.",
        "Failed to delete the country.",
    )
}

/// Country routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/country",
            get(list_countries)
                .post(create_country)
                .put(update_country)
                .delete(delete_country),
        )
        .route("/api/country/{id}", get(get_country))
        .route("/api/country/{id}/owners", get(list_country_owners))
        .route("/api/country/owner/{ownerId}", get(get_owner_country))
}
