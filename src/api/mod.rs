//! HTTP transport for the ladder operations

pub mod error;
pub mod routes;

pub use error::{ApiError, ErrorBody};
pub use routes::router;
