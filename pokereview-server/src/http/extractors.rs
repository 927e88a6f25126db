//! Custom Axum extractors
//!
//! Wrap axum's own extractors so that every rejection becomes an
//! `ApiError::Validation` and reaches the client as a 400 envelope.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::ApiError;
use crate::models::ValidationError;

fn malformed(reason: String) -> ApiError {
    ApiError::Validation(ValidationError::Malformed { reason })
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        malformed(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        malformed(rejection.body_text())
    }
}

/// JSON body; missing fields, wrong types and bad syntax are all 400.
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Query string deserialized into `T`.
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Integer id from the single path parameter.
///
/// Only the shape is checked here; an id no row carries is a 404 later.
pub struct ValidId(pub i32);

impl<S> FromRequestParts<S> for ValidId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id): Path<i32> = Path::from_request_parts(parts, state).await?;
        Ok(Self(id))
    }
}

/// `?id=` for PUT and DELETE. `{resource}Id` spellings are accepted too.
#[derive(Debug, Deserialize)]
struct TargetQuery {
    #[serde(
        alias = "categoryId",
        alias = "countryId",
        alias = "ownerId",
        alias = "pokemonId",
        alias = "reviewId",
        alias = "reviewerId"
    )]
    id: i32,
}

/// Integer id of the row a PUT or DELETE targets.
pub struct TargetId(pub i32);

impl<S> FromRequestParts<S> for TargetId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ValidQuery(query) = ValidQuery::<TargetQuery>::from_request_parts(parts, state).await?;
        Ok(Self(query.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request as HttpRequest;

    async fn target(uri: &str) -> Result<i32, ApiError> {
        let (mut parts, _) = HttpRequest::builder().uri(uri).body(()).unwrap().into_parts();
        TargetId::from_request_parts(&mut parts, &()).await.map(|t| t.0)
    }

    #[tokio::test]
    async fn target_id_accepts_aliases() {
        assert_eq!(target("/api/pokemon?id=3").await.unwrap(), 3);
        assert_eq!(target("/api/pokemon?pokemonId=4").await.unwrap(), 4);
        assert_eq!(target("/api/owner?ownerId=5").await.unwrap(), 5);
    }

    #[tokio::test]
    async fn target_id_rejects_missing_or_bad_values() {
        assert!(matches!(target("/api/pokemon").await, Err(ApiError::Validation(_))));
        assert!(matches!(target("/api/pokemon?id=abc").await, Err(ApiError::Validation(_))));
        assert!(matches!(target("/api/pokemon?id=1.5").await, Err(ApiError::Validation(_))));
    }

    #[tokio::test]
    async fn target_id_passes_non_positive_values_through() {
        assert_eq!(target("/api/pokemon?id=0").await.unwrap(), 0);
        assert_eq!(target("/api/review?reviewId=-3").await.unwrap(), -3);
    }
}
