use std::sync::Arc;

use crate::{
    application::{
        ports::{DocumentSearchProvider, ResultCache, SchemaIntrospector, SqlExecutor},
        services::{QueryHistory, QueryOrchestrator, SchemaDiscoveryService, SchemaStore},
        use_cases::{GetSchemaUseCase, IngestSchemaUseCase, RunQueryUseCase},
    },
    infrastructure::{
        cache::memory_cache::InMemoryResultCache,
        database::{
            connection::create_connection_pool, executor::PostgresSqlExecutor,
            introspection::PostgresIntrospector,
        },
        external_services::{
            inference_client::InferenceClient, pgvector_search::PgVectorDocumentSearch,
        },
    },
    presentation::http::handlers::{QueryHandler, SchemaHandler},
};

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_STATEMENT_TIMEOUT_MS: u64 = 5_000;

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

pub struct AppContainer {
    // Port implementations
    pub introspector: Arc<dyn SchemaIntrospector>,
    pub executor: Arc<dyn SqlExecutor>,
    pub result_cache: Arc<dyn ResultCache>,
    pub document_search: Arc<dyn DocumentSearchProvider>,

    // Application Services
    pub schema_store: Arc<SchemaStore>,
    pub schema_discovery: Arc<SchemaDiscoveryService>,
    pub query_orchestrator: Arc<QueryOrchestrator>,
    pub query_history: Arc<QueryHistory>,

    // Use Cases
    pub run_query_use_case: Arc<RunQueryUseCase>,
    pub ingest_schema_use_case: Arc<IngestSchemaUseCase>,
    pub get_schema_use_case: Arc<GetSchemaUseCase>,

    // HTTP Handlers
    pub query_handler: Arc<QueryHandler>,
    pub schema_handler: Arc<SchemaHandler>,
}

impl AppContainer {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Create database connection pool
        let db_pool = create_connection_pool()?;

        let cache_ttl_secs = env_u64("CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS);
        let statement_timeout_ms = env_u64("STATEMENT_TIMEOUT_MS", DEFAULT_STATEMENT_TIMEOUT_MS);

        // Create port implementations
        let introspector: Arc<dyn SchemaIntrospector> =
            Arc::new(PostgresIntrospector::new(db_pool.clone()));
        let executor: Arc<dyn SqlExecutor> = Arc::new(PostgresSqlExecutor::new(
            db_pool.clone(),
            statement_timeout_ms,
        ));
        let result_cache: Arc<dyn ResultCache> = Arc::new(InMemoryResultCache::new());

        let inference_client = InferenceClient::from_env()?;
        let document_search: Arc<dyn DocumentSearchProvider> =
            Arc::new(PgVectorDocumentSearch::new(db_pool, inference_client));

        // Create application services
        let schema_store = Arc::new(SchemaStore::new());
        let schema_discovery = Arc::new(SchemaDiscoveryService::new(introspector.clone()));
        let query_history = Arc::new(QueryHistory::new());

        let query_orchestrator = Arc::new(QueryOrchestrator::new(
            schema_store.clone(),
            schema_discovery.clone(),
            executor.clone(),
            result_cache.clone(),
            document_search.clone(),
            cache_ttl_secs,
        ));

        // Create use cases
        let run_query_use_case = Arc::new(RunQueryUseCase::new(
            query_orchestrator.clone(),
            query_history.clone(),
        ));
        let ingest_schema_use_case = Arc::new(IngestSchemaUseCase::new(
            schema_discovery.clone(),
            schema_store.clone(),
        ));
        let get_schema_use_case = Arc::new(GetSchemaUseCase::new(schema_store.clone()));

        // Create HTTP handlers
        let query_handler = Arc::new(QueryHandler::new(
            run_query_use_case.clone(),
            query_history.clone(),
        ));
        let schema_handler = Arc::new(SchemaHandler::new(
            ingest_schema_use_case.clone(),
            get_schema_use_case.clone(),
        ));

        Ok(Self {
            introspector,
            executor,
            result_cache,
            document_search,
            schema_store,
            schema_discovery,
            query_orchestrator,
            query_history,
            run_query_use_case,
            ingest_schema_use_case,
            get_schema_use_case,
            query_handler,
            schema_handler,
        })
    }
}
