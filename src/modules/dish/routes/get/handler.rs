use super::{service::service, types::request};
use crate::{types::Context, utils::filter::QueryFilter};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn handler(
    State(ctx): State<Arc<Context>>,
    Path(id): Path<String>,
    QueryFilter(filter): QueryFilter,
) -> impl IntoResponse {
    service(ctx, request::Payload { id, filter }).await
}
