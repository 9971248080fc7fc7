use super::{service::service, types::request};
use crate::{types::Context, utils::filter::QueryWhere};
use axum::{extract::State, response::IntoResponse};
use std::sync::Arc;

pub async fn handler(
    State(ctx): State<Arc<Context>>,
    QueryWhere(r#where): QueryWhere,
) -> impl IntoResponse {
    service(ctx, request::Payload { r#where }).await
}
