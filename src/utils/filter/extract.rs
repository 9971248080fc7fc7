use super::{Filter, FilterError, Where};
use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json, RequestPartsExt,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct FilterQuery {
    filter: Option<String>,
}

#[derive(Deserialize)]
struct WhereQuery {
    #[serde(rename = "where")]
    r#where: Option<String>,
}

/// The `?filter=<json>` query parameter; absent means match everything.
pub struct QueryFilter(pub Filter);

/// The `?where=<json>` query parameter; absent means match everything.
pub struct QueryWhere(pub Where);

fn reject(err: FilterError) -> Response {
    tracing::warn!("Rejected query filter: {err}");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": format!("Invalid filter: {err}") })),
    )
        .into_response()
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for QueryFilter {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = parts
            .extract::<Query<FilterQuery>>()
            .await
            .map_err(|err| reject(FilterError::new(err.body_text())))?;

        query
            .filter
            .as_deref()
            .map(Filter::from_json)
            .transpose()
            .map(|filter| QueryFilter(filter.unwrap_or_default()))
            .map_err(reject)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for QueryWhere {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = parts
            .extract::<Query<WhereQuery>>()
            .await
            .map_err(|err| reject(FilterError::new(err.body_text())))?;

        query
            .r#where
            .as_deref()
            .map(Where::from_json)
            .transpose()
            .map(|r#where| QueryWhere(r#where.unwrap_or_default()))
            .map_err(reject)
    }
}
