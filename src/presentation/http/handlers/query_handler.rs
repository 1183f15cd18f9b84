use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::services::QueryHistory;
use crate::application::use_cases::{
    RunQueryUseCase,
    run_query::{RunQueryError, RunQueryRequest},
};
use crate::presentation::http::dto::{
    ApiResponse, HistoryEntryDto, QueryHistoryResponseDto, QueryRequestDto, QueryResponseDto,
};

const HISTORY_TAIL: usize = 50;

pub struct QueryHandler {
    run_query_use_case: Arc<RunQueryUseCase>,
    history: Arc<QueryHistory>,
}

impl QueryHandler {
    pub fn new(run_query_use_case: Arc<RunQueryUseCase>, history: Arc<QueryHistory>) -> Self {
        Self {
            run_query_use_case,
            history,
        }
    }

    pub async fn run_query(
        State(handler): State<Arc<QueryHandler>>,
        Json(body): Json<QueryRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = RunQueryRequest {
            query: body.query,
            limit: body.limit,
            offset: body.offset,
        };

        match handler.run_query_use_case.execute(request).await {
            Ok(outcome) => {
                let dto = QueryResponseDto::from(outcome);
                Ok((
                    StatusCode::OK,
                    Json(ApiResponse::<QueryResponseDto>::success(dto)),
                ))
            }
            Err(RunQueryError::ValidationError(msg)) => Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error("EMPTY_QUERY".to_string(), msg, None)),
            )),
            Err(RunQueryError::Orchestration(err)) => Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "QUERY_FAILED".to_string(),
                    err.to_string(),
                    None,
                )),
            )),
        }
    }

    pub async fn query_history(
        State(handler): State<Arc<QueryHandler>>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let entries = handler
            .history
            .tail(HISTORY_TAIL)
            .into_iter()
            .map(HistoryEntryDto::from)
            .collect();

        Ok((
            StatusCode::OK,
            Json(ApiResponse::success(QueryHistoryResponseDto { entries })),
        ))
    }
}
