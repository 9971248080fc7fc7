mod count;
mod create;
mod delete;
mod get;
mod list;
mod replace;
mod search;
mod update;
mod update_many;

use crate::types::Context;
use axum::routing::Router;
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .merge(create::get_router())
        .merge(count::get_router())
        .merge(list::get_router())
        .merge(search::get_router())
        .merge(update_many::get_router())
        .merge(get::get_router())
        .merge(update::get_router())
        .merge(replace::get_router())
        .merge(delete::get_router())
}
