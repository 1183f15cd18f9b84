use serde::{Deserialize, Serialize};

use crate::application::services::query_history::HistoryEntry;
use crate::domain::entities::{PerformanceMetrics, QueryOutcome, QueryResults, QueryType};

#[derive(Debug, Deserialize)]
pub struct QueryRequestDto {
    pub query: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponseDto {
    pub query_type: QueryType,
    pub results: QueryResults,
    pub performance_metrics: PerformanceMetrics,
}

impl From<QueryOutcome> for QueryResponseDto {
    fn from(outcome: QueryOutcome) -> Self {
        Self {
            query_type: outcome.query_type,
            results: outcome.results,
            performance_metrics: outcome.performance_metrics,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueryHistoryResponseDto {
    pub entries: Vec<HistoryEntryDto>,
}

#[derive(Debug, Serialize)]
pub struct HistoryEntryDto {
    pub query: String,
    pub metrics: PerformanceMetrics,
}

impl From<HistoryEntry> for HistoryEntryDto {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            query: entry.query,
            metrics: entry.metrics,
        }
    }
}
