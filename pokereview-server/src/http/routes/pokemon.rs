//! Pokemon endpoints
//!
//! Besides CRUD: rating, category/owner/review traversals and
//! `AddPokemonOwner`, which links an owner to a pokemon.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::categories::CategoryDto;
use super::common::{committed, non_empty, StatusMessage};
use super::owners::OwnerDto;
use super::reviews::ReviewDto;
use crate::db::{Pokemon, PokemonInput};
use crate::http::error::ApiError;
use crate::http::extractors::{TargetId, ValidId, ValidJson, ValidQuery};
use crate::http::server::AppState;
use crate::models::{CategoryIds, Text, ValidationError};

/// Pokemon response; `birthDate` is `YYYY-MM-DD`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PokemonDto {
    pub id: i32,
    pub name: String,
    pub birth_date: NaiveDate,
}

impl From<Pokemon> for PokemonDto {
    fn from(p: Pokemon) -> Self {
        Self {
            id: p.id,
            name: p.name,
            birth_date: p.birth_date,
        }
    }
}

/// Create/edit pokemon request
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokemonForm {
    pub name: String,
    pub birth_date: NaiveDate,
    pub categories_id: Vec<i32>,
}

impl PokemonForm {
    fn validate(self) -> Result<(PokemonInput, CategoryIds), ValidationError> {
        let categories = CategoryIds::new(&self.categories_id)?;
        let pokemon = PokemonInput {
            name: Text::name("name", &self.name)?,
            birth_date: self.birth_date,
        };
        Ok((pokemon, categories))
    }
}

/// `?ownerId=&pokemonId=`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipQuery {
    pub owner_id: i32,
    pub pokemon_id: i32,
}

async fn ensure_categories(state: &AppState, categories: &CategoryIds) -> Result<(), ApiError> {
    for category_id in categories.iter() {
        if !state.categories.exists(category_id).await? {
            return Err(ApiError::unprocessable(format!(
                "There is no category associated with the category id {}.",
                category_id
            )));
        }
    }
    Ok(())
}

/// GET /api/pokemon - ordered by id
async fn list_pokemon(State(state): State<Arc<AppState>>) -> Result<Json<Vec<PokemonDto>>, ApiError> {
    let rows = state.pokemon.list().await?;
    Ok(Json(rows.into_iter().map(PokemonDto::from).collect()))
}

async fn get_pokemon(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<PokemonDto>, ApiError> {
    let pokemon = state
        .pokemon
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("pokemon", id))?;
    Ok(Json(PokemonDto::from(pokemon)))
}

/// GET /api/pokemon/{id}/rating - mean review rating, 0 without reviews
async fn get_rating(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<f64>, ApiError> {
    if !state.pokemon.exists(id).await? {
        return Err(ApiError::not_found("pokemon", id));
    }
    Ok(Json(state.pokemon.rating(id).await?))
}

async fn list_pokemon_categories(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<Vec<CategoryDto>>, ApiError> {
    let rows = state.pokemon.list_categories(id).await?;
    non_empty(rows, "categories for pokemon", id)
}

async fn list_pokemon_owners(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<Vec<OwnerDto>>, ApiError> {
    let rows = state.owners.list_for_pokemon(id).await?;
    non_empty(rows, "owners for pokemon", id)
}

/// GET /api/pokemon/{id}/reviews
pub(super) async fn list_pokemon_reviews(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
) -> Result<Json<Vec<ReviewDto>>, ApiError> {
    let rows = state.reviews.list_for_pokemon(id).await?;
    non_empty(rows, "reviews for pokemon", id)
}

/// POST /api/pokemon
async fn create_pokemon(
    State(state): State<Arc<AppState>>,
    ValidJson(form): ValidJson<PokemonForm>,
) -> Result<Json<StatusMessage>, ApiError> {
    let (pokemon, categories) = form.validate()?;
    ensure_categories(&state, &categories).await?;
    if state.pokemon.name_exists(pokemon.name.as_str()).await? {
        return Err(ApiError::unprocessable("Pokemon already exists."));
    }

    committed(
        state.pokemon.create(&pokemon, &categories).await?,
        "Successfully created the pokemon.",
        "Failed to create the pokemon.",
    )
}

/// GET /api/pokemon/AddPokemonOwner?ownerId=&pokemonId=
async fn add_pokemon_owner(
    State(state): State<Arc<AppState>>,
    ValidQuery(query): ValidQuery<OwnershipQuery>,
) -> Result<Json<StatusMessage>, ApiError> {
    let OwnershipQuery { owner_id, pokemon_id } = query;

    if !state.owners.exists(owner_id).await? {
        return Err(ApiError::unprocessable("There is no owner associated with the ownerId."));
    }
    if !state.pokemon.exists(pokemon_id).await? {
        return Err(ApiError::unprocessable(
            "There is no pokemon associated with the pokemonId.",
        ));
    }
    if state.pokemon.owner_exists(owner_id, pokemon_id).await? {
        return Err(ApiError::unprocessable("The owner already owns this pokemon."));
    }

    committed(
        state.pokemon.add_owner(owner_id, pokemon_id).await?,
        "Successfully added the pokemon owner.",
        "Failed to add the pokemon owner.",
    )
}

/// PUT /api/pokemon?id= - replaces name, birth date and the category set
async fn update_pokemon(
    State(state): State<Arc<AppState>>,
    TargetId(id): TargetId,
    ValidJson(form): ValidJson<PokemonForm>,
) -> Result<Json<StatusMessage>, ApiError> {
    let (pokemon, categories) = form.validate()?;
    if !state.pokemon.exists(id).await? {
        return Err(ApiError::not_found("pokemon", id));
    }
    ensure_categories(&state, &categories).await?;

    committed(
        state.pokemon.update(id, &pokemon, &categories).await?,
        "Successfully updated the pokemon.",
        "Failed to update the pokemon.",
    )
}

async fn delete_pokemon(
    State(state): State<Arc<AppState>>,
    TargetId(id): TargetId,
) -> Result<Json<StatusMessage>, ApiError> {
    if !state.pokemon.exists(id).await? {
        return Err(ApiError::not_found("pokemon", id));
    }

    committed(
        state.pokemon.delete(id).await?,
        "Successfully deleted the pokemon.",
        "Failed to delete the pokemon.",
    )
}

/// Pokemon routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/pokemon",
            get(list_pokemon)
                .post(create_pokemon)
                .put(update_pokemon)
                .delete(delete_pokemon),
        )
        .route("/api/pokemon/AddPokemonOwner", get(add_pokemon_owner))
        .route("/api/pokemon/{id}", get(get_pokemon))
        .route("/api/pokemon/{id}/rating", get(get_rating))
        .route("/api/pokemon/{id}/categories", get(list_pokemon_categories))
        .route("/api/pokemon/{id}/owners", get(list_pokemon_owners))
        .route("/api/pokemon/{id}/reviews", get(list_pokemon_reviews))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_date_round_trips_as_iso_date() {
        let form: PokemonForm = serde_json::from_value(serde_json::json!({
            "name": "Pikachu",
            "birthDate": "1996-02-27",
            "categoriesId": [2, 1, 2]
        }))
        .unwrap();
        let (pokemon, categories) = form.validate().unwrap();
        assert_eq!(categories.to_vec(), vec![1, 2]);

        let dto = PokemonDto {
            id: 1,
            name: pokemon.name.into_string(),
            birth_date: pokemon.birth_date,
        };
        let body = serde_json::to_value(dto).unwrap();
        assert_eq!(body["birthDate"], "1996-02-27");
    }

    #[test]
    fn empty_category_list_is_rejected() {
        let form = PokemonForm {
            name: "Eevee".into(),
            birth_date: NaiveDate::from_ymd_opt(1996, 2, 27).unwrap(),
            categories_id: Vec::new(),
        };
        assert!(matches!(
            form.validate(),
            Err(ValidationError::MissingItems { .. })
        ));
    }
}
