pub mod document_search;
pub mod result_cache;
pub mod schema_introspector;
pub mod sql_executor;

pub use document_search::DocumentSearchProvider;
pub use result_cache::ResultCache;
pub use schema_introspector::SchemaIntrospector;
pub use sql_executor::SqlExecutor;
