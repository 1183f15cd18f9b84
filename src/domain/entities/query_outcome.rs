use serde::{Deserialize, Serialize};

/// Routing decision for one request, from independent keyword-set checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Sql,
    Documents,
    Hybrid,
}

/// One ranked hit from the document-search collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentHit {
    pub score: f32,
    pub metadata: serde_json::Value,
}

/// Per-branch results. In hybrid mode a failure in one branch is recorded
/// here instead of failing the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<DocumentHit>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub cache_hit: bool,
    pub response_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryOutcome {
    pub query_type: QueryType,
    pub results: QueryResults,
    pub performance_metrics: PerformanceMetrics,
}
