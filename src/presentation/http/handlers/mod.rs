pub mod query_handler;
pub mod schema_handler;

pub use query_handler::QueryHandler;
pub use schema_handler::SchemaHandler;
