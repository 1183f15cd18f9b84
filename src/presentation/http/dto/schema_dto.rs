use serde::{Deserialize, Serialize};

use crate::application::use_cases::ingest_schema::IngestSchemaResponse;
use crate::domain::entities::Schema;

#[derive(Debug, Default, Deserialize)]
pub struct IngestDatabaseRequestDto {
    pub connection_string: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngestDatabaseResponseDto {
    pub table_count: usize,
    pub relationship_count: usize,
    pub version: u64,
}

impl From<IngestSchemaResponse> for IngestDatabaseResponseDto {
    fn from(response: IngestSchemaResponse) -> Self {
        Self {
            table_count: response.table_count,
            relationship_count: response.relationship_count,
            version: response.version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SchemaResponseDto {
    /// Null until a database has been ingested.
    pub schema: Option<Schema>,
    pub version: u64,
}
