use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::QueryHandler;

pub fn query_routes(query_handler: Arc<QueryHandler>) -> Router {
    Router::new()
        .route("/api/query", post(QueryHandler::run_query))
        .route("/api/query/history", get(QueryHandler::query_history))
        .with_state(query_handler)
}
