use std::env;

use async_trait::async_trait;
use diesel::prelude::*;
use pgvector::Vector;

use crate::application::ports::document_search::{
    DocumentMatch, DocumentSearchError, DocumentSearchProvider,
};
use crate::application::services::sql_synthesizer::quote_ident;
use crate::infrastructure::database::connection::{DbPool, get_connection_from_pool};
use crate::infrastructure::external_services::inference_client::InferenceClient;

#[derive(QueryableByName)]
struct MatchRow {
    #[diesel(sql_type = diesel::sql_types::Float4)]
    score: f32,
    #[diesel(sql_type = diesel::sql_types::Json)]
    metadata: serde_json::Value,
}

/// Semantic document search over a pgvector-indexed table. Embeds the query
/// text via the external inference service, then ranks stored rows by cosine
/// similarity.
pub struct PgVectorDocumentSearch {
    pool: DbPool,
    client: InferenceClient,
    document_table: String,
}

impl PgVectorDocumentSearch {
    pub fn new(pool: DbPool, client: InferenceClient) -> Self {
        let document_table =
            env::var("DOCUMENT_TABLE").unwrap_or_else(|_| "documents".to_string());
        Self {
            pool,
            client,
            document_table,
        }
    }
}

#[async_trait]
impl DocumentSearchProvider for PgVectorDocumentSearch {
    async fn embed(&self, text: &str) -> Result<Vector, DocumentSearchError> {
        let response = self
            .client
            .get_embedding(text)
            .await
            .map_err(|e| DocumentSearchError::EmbeddingError(e.to_string()))?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| {
                DocumentSearchError::EmbeddingError("No embeddings returned".to_string())
            })
    }

    async fn nearest_neighbors(
        &self,
        vector: &Vector,
        k: usize,
    ) -> Result<Vec<DocumentMatch>, DocumentSearchError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| DocumentSearchError::SearchError(e.to_string()))?;

        let sql = format!(
            "SELECT CAST(1 - (embedding <=> $1) AS REAL) AS score, \
                    row_to_json(_doc) AS metadata \
             FROM {} _doc \
             ORDER BY embedding <=> $1 \
             LIMIT {}",
            quote_ident(&self.document_table),
            k
        );

        let rows = diesel::sql_query(sql)
            .bind::<pgvector::sql_types::Vector, _>(vector.clone())
            .load::<MatchRow>(&mut conn)
            .map_err(|e| DocumentSearchError::SearchError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| DocumentMatch {
                score: row.score,
                metadata: strip_embedding(row.metadata),
            })
            .collect())
    }
}

/// Raw vectors are large and useless to API consumers, so they never leave
/// the search layer.
fn strip_embedding(mut metadata: serde_json::Value) -> serde_json::Value {
    if let Some(object) = metadata.as_object_mut() {
        object.remove("embedding");
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedding_field_is_removed_from_metadata() {
        let stripped = strip_embedding(json!({
            "title": "handbook",
            "embedding": [0.1, 0.2]
        }));

        assert_eq!(stripped, json!({"title": "handbook"}));
    }

    #[test]
    fn non_object_metadata_passes_through() {
        assert_eq!(strip_embedding(json!("plain")), json!("plain"));
    }
}
