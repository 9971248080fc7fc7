use super::types::{request, response};
use crate::{modules::dish::repository, types::Context};
use std::sync::Arc;
use validator::Validate;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    payload.body.validate().map_err(|errors| {
        tracing::warn!("Failed to validate payload: {errors}");
        response::Error::FailedToValidate(errors)
    })?;

    ctx.dishes
        .update_by_id(&payload.id, payload.body.into())
        .await
        .map(|_| response::Success::DishUpdated)
        .map_err(|err| match err {
            repository::Error::NotFound => response::Error::DishNotFound,
            _ => response::Error::FailedToUpdateDish,
        })
}
