use async_trait::async_trait;
use pgvector::Vector;

#[derive(Debug)]
pub enum DocumentSearchError {
    EmbeddingError(String),
    SearchError(String),
}

impl std::fmt::Display for DocumentSearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentSearchError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            DocumentSearchError::SearchError(msg) => write!(f, "Search error: {}", msg),
        }
    }
}

impl std::error::Error for DocumentSearchError {}

#[derive(Debug, Clone)]
pub struct DocumentMatch {
    pub score: f32,
    pub metadata: serde_json::Value,
}

/// Opaque document-search collaborator. How vectors are produced or indexed
/// is not this crate's concern.
#[async_trait]
pub trait DocumentSearchProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vector, DocumentSearchError>;

    async fn nearest_neighbors(
        &self,
        vector: &Vector,
        k: usize,
    ) -> Result<Vec<DocumentMatch>, DocumentSearchError>;
}
