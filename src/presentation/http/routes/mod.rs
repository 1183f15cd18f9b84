pub mod health_routes;
pub mod query_routes;
pub mod schema_routes;

pub use health_routes::*;
pub use query_routes::*;
pub use schema_routes::*;
