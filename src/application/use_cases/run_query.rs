use std::sync::Arc;
use std::time::Instant;

use crate::application::services::query_orchestrator::{OrchestratorError, QueryOrchestrator};
use crate::application::services::QueryHistory;
use crate::domain::entities::QueryOutcome;

#[derive(Debug)]
pub enum RunQueryError {
    ValidationError(String),
    Orchestration(OrchestratorError),
}

impl std::fmt::Display for RunQueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunQueryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            RunQueryError::Orchestration(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RunQueryError {}

#[derive(Debug, Clone)]
pub struct RunQueryRequest {
    pub query: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub struct RunQueryUseCase {
    orchestrator: Arc<QueryOrchestrator>,
    history: Arc<QueryHistory>,
}

impl RunQueryUseCase {
    pub fn new(orchestrator: Arc<QueryOrchestrator>, history: Arc<QueryHistory>) -> Self {
        Self {
            orchestrator,
            history,
        }
    }

    pub async fn execute(&self, request: RunQueryRequest) -> Result<QueryOutcome, RunQueryError> {
        if request.query.trim().is_empty() {
            return Err(RunQueryError::ValidationError(
                "Query cannot be empty".to_string(),
            ));
        }

        let started = Instant::now();
        let limit = request.limit.unwrap_or(50);
        let offset = request.offset.unwrap_or(0);

        let mut outcome = self
            .orchestrator
            .run(&request.query, limit, offset)
            .await
            .map_err(RunQueryError::Orchestration)?;

        outcome.performance_metrics.response_time_ms = started.elapsed().as_millis() as u64;
        self.history
            .record(&request.query, outcome.performance_metrics);

        Ok(outcome)
    }
}
