use super::types::{request, response};
use crate::{modules::dish::repository, types::Context};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    ctx.dishes
        .count(&payload.r#where)
        .await
        .map(response::Success::Count)
        .map_err(|err| match err {
            repository::Error::InvalidFilter(message) => response::Error::InvalidFilter(message),
            _ => response::Error::FailedToCountDishes,
        })
}
