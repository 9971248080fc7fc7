use super::types::{request, response};
use crate::{modules::dish::repository, types::Context};
use std::sync::Arc;
use validator::Validate;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    payload.body.validate().map_err(|errors| {
        tracing::warn!("Failed to validate payload: {errors}");
        response::Error::FailedToValidate(errors)
    })?;

    if matches!(&payload.body.id, Some(id) if *id != payload.id) {
        return Err(response::Error::IdMismatch);
    }

    ctx.dishes
        .replace_by_id(
            &payload.id,
            repository::ReplaceDishPayload {
                name: payload.body.name,
                attributes: payload.body.attributes,
            },
        )
        .await
        .map(|_| response::Success::DishReplaced)
        .map_err(|err| match err {
            repository::Error::NotFound => response::Error::DishNotFound,
            _ => response::Error::FailedToReplaceDish,
        })
}
