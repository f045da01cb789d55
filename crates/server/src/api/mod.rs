pub mod download;
pub mod handlers;
pub mod routes;
pub mod streams;

pub use routes::create_router;
