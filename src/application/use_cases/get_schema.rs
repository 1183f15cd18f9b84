use std::sync::Arc;

use crate::application::services::SchemaStore;
use crate::domain::entities::Schema;

#[derive(Debug, Clone)]
pub struct GetSchemaResponse {
    pub schema: Option<Arc<Schema>>,
    pub version: u64,
}

/// Reads back the current snapshot for visualization; absent when nothing
/// has been ingested yet.
pub struct GetSchemaUseCase {
    schema_store: Arc<SchemaStore>,
}

impl GetSchemaUseCase {
    pub fn new(schema_store: Arc<SchemaStore>) -> Self {
        Self { schema_store }
    }

    pub fn execute(&self) -> GetSchemaResponse {
        let (schema, version) = self.schema_store.snapshot();
        GetSchemaResponse { schema, version }
    }
}
