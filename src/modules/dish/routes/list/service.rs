use super::types::{request, response};
use crate::{modules::dish::repository, types::Context};
use serde_json::Value;
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    let dishes = ctx
        .dishes
        .find(&payload.filter)
        .await
        .map_err(|err| match err {
            repository::Error::InvalidFilter(message) => response::Error::InvalidFilter(message),
            _ => response::Error::FailedToFetchDishes,
        })?;

    Ok(response::Success::Dishes(
        dishes
            .into_iter()
            .map(|dish| Value::Object(payload.filter.fields.project(dish.to_document())))
            .collect(),
    ))
}
