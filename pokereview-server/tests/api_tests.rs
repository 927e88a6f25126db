//! End-to-end API tests
//!
//! Drive the full router (routes, extractors, error envelopes) against the
//! in-memory store.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use pokereview_server::{build_router, AppState, MemoryStore, ServerConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_app() -> (MemoryStore, Router) {
    let store = MemoryStore::new();
    let app = build_router(AppState::in_memory(store.clone()), &ServerConfig::default());
    (store, app)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

/// Two categories, one country, two owners, one pokemon (in category 1),
/// one reviewer.
async fn seeded_app() -> (MemoryStore, Router) {
    let (store, app) = test_app();
    for name in ["Electric", "Mouse"] {
        let (status, _) = post(&app, "/api/category", json!({ "name": name })).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(post(&app, "/api/country", json!({ "name": "Kanto" })).await.0, StatusCode::OK);
    for (first, last) in [("Ash", "Ketchum"), ("Misty", "Waterflower")] {
        let (status, _) = post(
            &app,
            "/api/owner",
            json!({ "firstName": first, "lastName": last, "gym": "Pallet", "countryId": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = post(
        &app,
        "/api/pokemon",
        json!({ "name": "Pikachu", "birthDate": "1996-02-27", "categoriesId": [1] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post(&app, "/api/reviewer", json!({ "firstName": "Gary", "lastName": "Oak" })).await;
    assert_eq!(status, StatusCode::OK);
    (store, app)
}

// ============================================================================
// Health & envelopes
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let (_, app) = test_app();
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_create_returns_success_envelope() {
    let (_, app) = test_app();
    let (status, body) = post(&app, "/api/category", json!({ "name": "Fire" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statusCode"], 200);
    assert_eq!(body["message"], "Successfully saved the category.");

    let (status, list) = get(&app, "/api/category").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([{ "id": 1, "name": "Fire" }]));
}

#[tokio::test]
async fn test_malformed_payloads_are_400() {
    let (_, app) = test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/category")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = post(&app, "/api/category", json!({ "title": "no name" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);

    let (status, _) = post(&app, "/api/category", json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/api/category/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_missing_ids_are_404() {
    let (_, app) = seeded_app().await;
    for uri in [
        "/api/category/99",
        "/api/country/99",
        "/api/owner/99",
        "/api/pokemon/99",
        "/api/review/99",
        "/api/reviewer/99",
        "/api/pokemon/99/rating",
        "/api/country/owner/99",
        "/api/pokemon/0",
        "/api/category/0",
        "/api/reviewer/-1",
        "/api/pokemon/0/rating",
    ] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body["statusCode"], 404, "{}", uri);
    }
}

#[tokio::test]
async fn test_empty_related_collections_are_404() {
    let (_, app) = seeded_app().await;
    assert_eq!(get(&app, "/api/category/2/pokemon").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/api/category/pokemon/2").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/api/owner/1/pokemon").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/api/pokemon/1/reviews").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/api/reviewer/1/reviews").await.0, StatusCode::NOT_FOUND);

    let (status, pokemon) = get(&app, "/api/category/1/pokemon").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pokemon, json!([{ "id": 1, "name": "Pikachu", "birthDate": "1996-02-27" }]));
}

#[tokio::test]
async fn test_owner_reads_include_country() {
    let (_, app) = seeded_app().await;
    let (status, owner) = get(&app, "/api/owner/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(owner["firstName"], "Ash");
    assert_eq!(owner["country"], json!({ "id": 1, "name": "Kanto" }));

    let (status, country) = get(&app, "/api/country/owner/2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(country["name"], "Kanto");

    let (status, owners) = get(&app, "/api/country/1/owners").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(owners.as_array().map(Vec::len), Some(2));
    assert!(owners[0].get("country").is_none());
}

// ============================================================================
// Natural keys & references
// ============================================================================

#[tokio::test]
async fn test_duplicate_names_are_422() {
    let (_, app) = seeded_app().await;

    let (status, body) = post(&app, "/api/category", json!({ "name": "  electric " })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["statusCode"], 422);

    let (status, _) = post(&app, "/api/country", json!({ "name": "KANTO" })).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = post(
        &app,
        "/api/pokemon",
        json!({ "name": "pikachu", "birthDate": "2000-01-01", "categoriesId": [2] }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Pokemon already exists.");
}

#[tokio::test]
async fn test_missing_references_are_422() {
    let (_, app) = seeded_app().await;

    let (status, body) = post(
        &app,
        "/api/owner",
        json!({ "firstName": "Brock", "lastName": "Harrison", "gym": "Pewter", "countryId": 9 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "There is no country associated with this countryId.");

    let (status, body) = post(
        &app,
        "/api/owner",
        json!({ "firstName": "Brock", "lastName": "Harrison", "gym": "Pewter", "countryId": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["statusCode"], 422);

    let (status, _) = post(
        &app,
        "/api/pokemon",
        json!({ "name": "Eevee", "birthDate": "1996-02-27", "categoriesId": [1, 7] }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(get(&app, "/api/pokemon/2").await.0, StatusCode::NOT_FOUND);

    let (status, body) = post(
        &app,
        "/api/pokemon",
        json!({ "name": "Eevee", "birthDate": "1996-02-27", "categoriesId": [0] }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "There is no category associated with the category id 0.");

    let (status, _) = post(
        &app,
        "/api/review",
        json!({ "title": "Nice", "text": "Cute", "rating": 4, "reviewerId": 5, "pokemonId": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = post(
        &app,
        "/api/review",
        json!({ "title": "Nice", "text": "Cute", "rating": 4, "reviewerId": 1, "pokemonId": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_pokemon_requires_categories() {
    let (_, app) = seeded_app().await;
    let (status, body) = post(
        &app,
        "/api/pokemon",
        json!({ "name": "Eevee", "birthDate": "1996-02-27", "categoriesId": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing categories id.");

    let (status, _) = post(
        &app,
        "/api/pokemon",
        json!({ "name": "Eevee", "birthDate": "not-a-date", "categoriesId": [1] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Ownership & rating
// ============================================================================

#[tokio::test]
async fn test_add_pokemon_owner() {
    let (_, app) = seeded_app().await;

    let (status, body) = get(&app, "/api/pokemon/AddPokemonOwner?ownerId=1&pokemonId=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statusCode"], 200);

    let (status, _) = get(&app, "/api/pokemon/AddPokemonOwner?ownerId=1&pokemonId=1").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = get(&app, "/api/pokemon/AddPokemonOwner?ownerId=9&pokemonId=1").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = get(&app, "/api/pokemon/AddPokemonOwner?ownerId=1&pokemonId=9").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = get(&app, "/api/pokemon/AddPokemonOwner?ownerId=0&pokemonId=1").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "There is no owner associated with the ownerId.");

    let (status, _) = get(&app, "/api/pokemon/AddPokemonOwner?ownerId=1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, pokemon) = get(&app, "/api/owner/1/pokemons").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pokemon[0]["name"], "Pikachu");

    let (status, owners) = get(&app, "/api/pokemon/1/owners").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(owners.as_array().map(Vec::len), Some(1));
    assert_eq!(owners[0]["firstName"], "Ash");
    assert!(owners[0].get("country").is_none());

    let (_, owner) = get(&app, "/api/owner/1").await;
    assert_eq!(owner["country"]["name"], "Kanto");
}

#[tokio::test]
async fn test_rating_is_mean_of_reviews() {
    let (_, app) = seeded_app().await;

    let (status, rating) = get(&app, "/api/pokemon/1/rating").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rating.as_f64(), Some(0.0));

    for rating in [3, 5] {
        let (status, _) = post(
            &app,
            "/api/review",
            json!({ "title": "Review", "text": "Text", "rating": rating, "reviewerId": 1, "pokemonId": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, rating) = get(&app, "/api/pokemon/1/rating").await;
    assert_eq!(rating.as_f64(), Some(4.0));

    let (status, reviews) = get(&app, "/api/review").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews[0]["pokemon"]["name"], "Pikachu");

    let (status, reviews) = get(&app, "/api/review/pokemon/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reviews.as_array().map(Vec::len), Some(2));
}

// ============================================================================
// Updates & deletes
// ============================================================================

#[tokio::test]
async fn test_update_pokemon_replaces_categories() {
    let (_, app) = seeded_app().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/pokemon?pokemonId=1",
        Some(json!({ "name": "Pikachu", "birthDate": "1996-02-27", "categoriesId": [2] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully updated the pokemon.");

    let (_, categories) = get(&app, "/api/pokemon/1/categories").await;
    assert_eq!(categories, json!([{ "id": 2, "name": "Mouse" }]));

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/pokemon?id=1",
        Some(json!({ "name": "Pikachu", "birthDate": "1996-02-27", "categoriesId": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_missing_row_is_404() {
    let (_, app) = seeded_app().await;
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/reviewer?id=42",
        Some(json!({ "firstName": "Nobody", "lastName": "Here" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/pokemon?id=0", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::PUT, "/api/category", Some(json!({ "name": "X" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_owner_keeps_others() {
    let (_, app) = seeded_app().await;
    get(&app, "/api/pokemon/AddPokemonOwner?ownerId=1&pokemonId=1").await;

    let (status, _) = send(&app, Method::DELETE, "/api/owner?ownerId=1", None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(get(&app, "/api/owner/1").await.0, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/api/owner/2").await.0, StatusCode::OK);
    assert_eq!(get(&app, "/api/pokemon/1/owners").await.0, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::DELETE, "/api/owner?id=1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_country_cascades_to_owners() {
    let (_, app) = seeded_app().await;
    let (status, _) = send(&app, Method::DELETE, "/api/country?id=1", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, owners) = get(&app, "/api/owner").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(owners, json!([]));
}

#[tokio::test]
async fn test_update_review_keeps_links() {
    let (_, app) = seeded_app().await;
    post(
        &app,
        "/api/review",
        json!({ "title": "Meh", "text": "Too loud", "rating": 2, "reviewerId": 1, "pokemonId": 1 }),
    )
    .await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/review?reviewId=1",
        Some(json!({ "title": "Great", "text": "Grew on me", "rating": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, review) = get(&app, "/api/review/1").await;
    assert_eq!(review["title"], "Great");
    assert_eq!(review["rating"], 5);
    assert_eq!(review["pokemon"]["id"], 1);
}

// ============================================================================
// Persistence failures
// ============================================================================

#[tokio::test]
async fn test_unsaved_commit_is_500() {
    let (store, app) = seeded_app().await;
    store.fail_writes(true);

    let (status, body) = post(&app, "/api/category", json!({ "name": "Water" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["statusCode"], 500);
    assert_eq!(body["message"], "Failed to save the category.");

    let (status, body) = send(&app, Method::DELETE, "/api/pokemon?id=1", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to delete the pokemon.");

    store.fail_writes(false);
    assert_eq!(get(&app, "/api/pokemon/1").await.0, StatusCode::OK);
}
