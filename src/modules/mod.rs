pub mod dish;

mod router;
pub use router::get_router;
