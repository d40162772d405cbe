pub mod handlers;
pub mod middleware;
pub mod retrieve;
pub mod routes;

pub use routes::create_router;

use serde::Serialize;

/// Error body shared by all JSON endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
