use super::types::{request, response};
use crate::{modules::dish::repository, types::Context};
use std::sync::Arc;
use validator::Validate;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    payload.validate().map_err(|errors| {
        tracing::warn!("Failed to validate payload: {errors}");
        response::Error::FailedToValidate(errors)
    })?;

    ctx.dishes
        .create(repository::CreateDishPayload {
            name: payload.name,
            attributes: payload.attributes,
        })
        .await
        .map_err(|_| response::Error::FailedToCreateDish)
        .map(response::Success::DishCreated)
}
