use super::types::{request, response};
use crate::{modules::dish::repository, types::Context};
use serde_json::Value;
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    if !payload.filter.r#where.is_empty() {
        return Err(response::Error::InvalidFilter(String::from(
            "`where` is not accepted when fetching a dish by id",
        )));
    }

    ctx.dishes
        .find_by_id(&payload.id, &payload.filter)
        .await
        .map(|dish| {
            response::Success::Dish(Value::Object(
                payload.filter.fields.project(dish.to_document()),
            ))
        })
        .map_err(|err| match err {
            repository::Error::NotFound => response::Error::DishNotFound,
            repository::Error::InvalidFilter(message) => response::Error::InvalidFilter(message),
            repository::Error::UnexpectedError => response::Error::FailedToFetchDish,
        })
}
