use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::SchemaHandler;

pub fn schema_routes(schema_handler: Arc<SchemaHandler>) -> Router {
    Router::new()
        .route("/api/ingest/database", post(SchemaHandler::ingest_database))
        .route("/api/schema", get(SchemaHandler::get_schema))
        .with_state(schema_handler)
}
