use std::sync::Arc;

use crate::application::ports::schema_introspector::IntrospectionError;
use crate::application::services::{SchemaDiscoveryService, SchemaStore};

#[derive(Debug)]
pub enum IngestSchemaError {
    Introspection(IntrospectionError),
}

impl std::fmt::Display for IngestSchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestSchemaError::Introspection(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for IngestSchemaError {}

#[derive(Debug, Clone, Default)]
pub struct IngestSchemaRequest {
    /// Introspect this database instead of the one the service was started
    /// against.
    pub connection_string: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IngestSchemaResponse {
    pub table_count: usize,
    pub relationship_count: usize,
    pub version: u64,
}

/// Discovers a schema snapshot and atomically installs it, bumping the
/// version token so every cached result is implicitly invalidated.
pub struct IngestSchemaUseCase {
    discovery: Arc<SchemaDiscoveryService>,
    schema_store: Arc<SchemaStore>,
}

impl IngestSchemaUseCase {
    pub fn new(discovery: Arc<SchemaDiscoveryService>, schema_store: Arc<SchemaStore>) -> Self {
        Self {
            discovery,
            schema_store,
        }
    }

    pub async fn execute(
        &self,
        request: IngestSchemaRequest,
    ) -> Result<IngestSchemaResponse, IngestSchemaError> {
        let schema = self
            .discovery
            .discover(request.connection_string.as_deref())
            .await
            .map_err(IngestSchemaError::Introspection)?;

        let table_count = schema.tables.len();
        let relationship_count = schema.relationships.len();
        let (_, version) = self.schema_store.replace(schema);

        tracing::info!(
            tables = table_count,
            relationships = relationship_count,
            version,
            "schema ingested"
        );

        Ok(IngestSchemaResponse {
            table_count,
            relationship_count,
            version,
        })
    }
}
