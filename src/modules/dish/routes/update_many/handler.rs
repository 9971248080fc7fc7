use super::{service::service, types::request};
use crate::{
    modules::dish::types::DishPatch,
    types::Context,
    utils::{filter::QueryWhere, json::JsonBody},
};
use axum::{extract::State, response::IntoResponse};
use std::sync::Arc;

pub async fn handler(
    State(ctx): State<Arc<Context>>,
    QueryWhere(r#where): QueryWhere,
    JsonBody(body): JsonBody<DishPatch>,
) -> impl IntoResponse {
    service(ctx, request::Payload { r#where, body }).await
}
