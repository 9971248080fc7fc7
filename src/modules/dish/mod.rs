pub mod repository;
pub mod routes;
pub mod types;

pub use routes::get_router;
