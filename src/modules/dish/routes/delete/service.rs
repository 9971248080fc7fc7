use super::types::{request, response};
use crate::{modules::dish::repository, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    ctx.dishes
        .delete_by_id(&payload.id)
        .await
        .map(|_| response::Success::DishDeleted)
        .map_err(|err| match err {
            repository::Error::NotFound => response::Error::DishNotFound,
            _ => response::Error::FailedToDeleteDish,
        })
}
