pub mod get_schema;
pub mod ingest_schema;
pub mod run_query;

pub use get_schema::GetSchemaUseCase;
pub use ingest_schema::IngestSchemaUseCase;
pub use run_query::RunQueryUseCase;
