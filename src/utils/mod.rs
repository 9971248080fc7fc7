pub mod database;
pub mod filter;
pub mod json;
pub mod validation;
