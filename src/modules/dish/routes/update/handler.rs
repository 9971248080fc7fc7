use super::{service::service, types::request};
use crate::{modules::dish::types::DishPatch, types::Context, utils::json::JsonBody};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn handler(
    State(ctx): State<Arc<Context>>,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<DishPatch>,
) -> impl IntoResponse {
    service(ctx, request::Payload { id, body }).await
}
