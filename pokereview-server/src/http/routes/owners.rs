//! Owner endpoints

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use super::common::{committed, non_empty, StatusMessage};
use super::countries::CountryDto;
use super::pokemon::PokemonDto;
use crate::db::{Owner, OwnerInput};
use crate::http::error::ApiError;
use crate::http::extractors::{TargetId, ValidId, ValidJson};
use crate::http::server::AppState;
use crate::models::{Text, ValidationError};

/// Owner response
///
/// `country` is filled by `GET /api/owner` and `GET /api/owner/{id}`. The join
/// traversals (`/api/pokemon/{id}/owners`, `/api/country/{id}/owners`) don't
/// load it, so the field is omitted there.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDto {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub gym: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<CountryDto>,
}

impl From<Owner> for OwnerDto {
    fn from(o: Owner) -> Self {
        Self {
            id: o.id,
            first_name: o.first_name,
            last_name: o.last_name,
            gym: o.gym,
            country: o.country.map(CountryDto::from),
        }
    }
}

/// Create/edit owner request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerForm {
    pub first_name: String,
    pub last_name: String,
    pub gym: String,
    pub country_id: i32,
}

impl OwnerForm {
    fn validate(self) -> Result<OwnerInput, ValidationError> {
        Ok(OwnerInput {
            first_name: Text::name("firstName", &self.first_name)?,
            last_name: Text::name("lastName", &self.last_name)?,
            gym: Text::name("gym", &self.gym)?,
            country_id: self.country_id,
        })
    }
}

async fn ensure_country(state: &AppState, country_id: i32) -> Result<(), ApiError> {
    if !state.countries.exists(country_id).await? {
        return Err(ApiError::unprocessable(
            "There is no country associated with this countryId.",
        ));
    }
    Ok(())
}

/// GET /api/owner - owners with their country
async fn list_owners(State(state): State<Arc<AppState>>) -> Result<Json<Vec<OwnerDto>>, ApiError> {
    let rows = state.owners.list().await?;
    Ok(Json(rows.into_iter().map(OwnerDto::from).collect()))
}

async fn get_owner(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<OwnerDto>, ApiError> {
    let owner = state
        .owners
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("owner", id))?;
    Ok(Json(OwnerDto::from(owner)))
}

/// GET /api/owner/{id}/pokemon
async fn list_owner_pokemon(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<Vec<PokemonDto>>, ApiError> {
    let rows = state.owners.list_pokemon(id).await?;
    non_empty(rows, "pokemon for owner", id)
}

async fn create_owner(
    State(state): State<Arc<AppState>>,
    ValidJson(form): ValidJson<OwnerForm>,
) -> Result<Json<StatusMessage>, ApiError> {
    let owner = form.validate()?;
    ensure_country(&state, owner.country_id).await?;

    committed(
        state.owners.create(&owner).await?,
        "Successfully saved the owner.",
        "Failed to save the owner.",
    )
}

async fn update_owner(
    State(state): State<Arc<AppState>>,
    TargetId(id): TargetId,
    ValidJson(form): ValidJson<OwnerForm>,
) -> Result<Json<StatusMessage>, ApiError> {
    let owner = form.validate()?;
    if !state.owners.exists(id).await? {
        return Err(ApiError::not_found("owner", id));
    }
    ensure_country(&state, owner.country_id).await?;

    committed(
        state.owners.update(id, &owner).await?,
        "Successfully updated the owner.",
        "Failed to update the owner.",
    )
}

async fn delete_owner(
    State(state): State<Arc<AppState>>,
    TargetId(id): TargetId,
) -> Result<Json<StatusMessage>, ApiError> {
    if !state.owners.exists(id).await? {
        return Err(ApiError::not_found("owner", id));
    }

    committed(
        state.owners.delete(id).await?,
        "Successfully deleted the owner.",
        "Failed to delete the owner.",
    )
}

/// Owner routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/owner",
            get(list_owners)
                .post(create_owner)
                .put(update_owner)
                .delete(delete_owner),
        )
        .route("/api/owner/{id}", get(get_owner))
        .route("/api/owner/{id}/pokemon", get(list_owner_pokemon))
        .route("/api/owner/{id}/pokemons", get(list_owner_pokemon))
}
