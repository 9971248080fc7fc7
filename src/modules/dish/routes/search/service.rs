use super::types::{request, response};
use crate::{
    modules::dish::repository,
    types::Context,
    utils::filter::{Condition, Filter, Pattern, Where},
};
use std::sync::Arc;

pub async fn service(ctx: Arc<Context>, payload: request::Payload) -> response::Response {
    let filter = Filter {
        r#where: Where::field(
            "name",
            Condition::Like {
                pattern: Pattern::contains_ignore_case(&payload.name),
                negated: false,
            },
        ),
        ..Default::default()
    };

    ctx.dishes
        .find(&filter)
        .await
        .map(response::Success::Dishes)
        .map_err(|err| match err {
            repository::Error::InvalidFilter(message) => response::Error::InvalidSearch(message),
            _ => response::Error::FailedToSearchDishes,
        })
}
