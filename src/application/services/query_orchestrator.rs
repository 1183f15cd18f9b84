use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::application::ports::document_search::DocumentSearchProvider;
use crate::application::ports::result_cache::ResultCache;
use crate::application::ports::schema_introspector::IntrospectionError;
use crate::application::ports::sql_executor::{QueryExecutionError, SqlExecutor};
use crate::application::services::intent_extractor::IntentExtractor;
use crate::application::services::schema_discovery::SchemaDiscoveryService;
use crate::application::services::schema_store::SchemaStore;
use crate::application::services::sql_synthesizer::{SqlSynthesizer, paginate};
use crate::domain::entities::{
    DocumentHit, PerformanceMetrics, QueryOutcome, QueryResults, QueryType, Schema,
};

const DOCUMENT_TERMS: &[&str] = &["resume", "cv", "document", "review", "pdf"];
const SQL_TERMS: &[&str] = &[
    "count",
    "list",
    "average",
    "avg",
    "sum",
    "top",
    "hired",
    "joined",
    "trend",
    "month",
    "salary",
    "department",
    "dept",
    "division",
    "divisions",
    "manager",
    "reports to",
    "before",
    "after",
    "location",
    "mumbai",
    "bangalore",
    "chennai",
    "delhi",
    "hyderabad",
    "pay",
    "compensation",
    "how many",
    "show",
    "employees",
    "staff",
];

const DOCUMENT_TOP_K: usize = 3;

#[derive(Debug)]
pub enum OrchestratorError {
    SchemaUnavailable(IntrospectionError),
    Execution(QueryExecutionError),
}

impl std::fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrchestratorError::SchemaUnavailable(err) => {
                write!(f, "Schema unavailable: {}", err)
            }
            OrchestratorError::Execution(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for OrchestratorError {}

/// Classify a request by independent keyword-set membership: document terms
/// and SQL terms each vote, and both voting yields hybrid.
pub fn classify(query: &str) -> QueryType {
    let lowered = query.to_lowercase();
    let is_doc = DOCUMENT_TERMS.iter().any(|kw| lowered.contains(kw));
    let is_sql = SQL_TERMS.iter().any(|kw| lowered.contains(kw));
    match (is_doc, is_sql) {
        (true, true) => QueryType::Hybrid,
        (true, false) => QueryType::Documents,
        _ => QueryType::Sql,
    }
}

/// Fixed-length cache key scoped by the snapshot version token, so every
/// re-ingest implicitly invalidates all previous entries.
pub fn cache_key(version: u64, query: &str, limit: i64, offset: i64) -> String {
    let normalized = query.trim().to_lowercase();
    let digest = Sha256::digest(format!("{}|{}|{}|{}", version, normalized, limit, offset));
    let hex: String = digest.iter().map(|byte| format!("{:02x}", byte)).collect();
    format!("q:{}", hex)
}

/// Drives one request through classification, intent extraction, SQL
/// synthesis, execution and document search, merging results with the
/// best-effort cache.
pub struct QueryOrchestrator {
    schema_store: Arc<SchemaStore>,
    discovery: Arc<SchemaDiscoveryService>,
    executor: Arc<dyn SqlExecutor>,
    cache: Arc<dyn ResultCache>,
    document_search: Arc<dyn DocumentSearchProvider>,
    extractor: IntentExtractor,
    synthesizer: SqlSynthesizer,
    cache_ttl_secs: u64,
}

impl QueryOrchestrator {
    pub fn new(
        schema_store: Arc<SchemaStore>,
        discovery: Arc<SchemaDiscoveryService>,
        executor: Arc<dyn SqlExecutor>,
        cache: Arc<dyn ResultCache>,
        document_search: Arc<dyn DocumentSearchProvider>,
        cache_ttl_secs: u64,
    ) -> Self {
        Self {
            schema_store,
            discovery,
            executor,
            cache,
            document_search,
            extractor: IntentExtractor::new(),
            synthesizer: SqlSynthesizer::new(),
            cache_ttl_secs,
        }
    }

    pub async fn run(
        &self,
        query_text: &str,
        limit: i64,
        offset: i64,
    ) -> Result<QueryOutcome, OrchestratorError> {
        let (schema, version) = self.current_schema().await?;

        let key = cache_key(version, query_text, limit, offset);
        if let Some(outcome) = self.cached_outcome(&key).await {
            return Ok(outcome);
        }

        let query_type = classify(query_text);
        let mut results = QueryResults::default();

        if matches!(query_type, QueryType::Sql | QueryType::Hybrid) {
            match self.run_sql(query_text, &schema, limit, offset).await {
                Ok(rows) => results.table = Some(rows),
                Err(err) => {
                    if query_type == QueryType::Sql {
                        return Err(OrchestratorError::Execution(err));
                    }
                    // Hybrid: the document branch still gets its chance.
                    tracing::warn!("sql branch failed in hybrid mode: {}", err);
                    results.table_error = Some(err.to_string());
                }
            }
        }

        if matches!(query_type, QueryType::Documents | QueryType::Hybrid) {
            match self.search_documents(query_text).await {
                Ok(hits) => results.documents = Some(hits),
                Err(err) => {
                    tracing::warn!("document search failed: {}", err);
                    results.documents_error = Some(err.to_string());
                }
            }
        }

        let outcome = QueryOutcome {
            query_type,
            results,
            performance_metrics: PerformanceMetrics {
                cache_hit: false,
                response_time_ms: 0,
            },
        };

        self.write_cache(&key, &outcome).await;
        Ok(outcome)
    }

    /// Current snapshot, discovering lazily on the first query if nothing
    /// was ever ingested.
    async fn current_schema(&self) -> Result<(Arc<Schema>, u64), OrchestratorError> {
        match self.schema_store.snapshot() {
            (Some(schema), version) => Ok((schema, version)),
            (None, _) => {
                let discovered = self
                    .discovery
                    .discover(None)
                    .await
                    .map_err(OrchestratorError::SchemaUnavailable)?;
                Ok(self.schema_store.replace(discovered))
            }
        }
    }

    async fn cached_outcome(&self, key: &str) -> Option<QueryOutcome> {
        // Any cache failure is a miss.
        let payload = self.cache.get(key).await.ok().flatten()?;
        let mut outcome: QueryOutcome = serde_json::from_str(&payload).ok()?;
        outcome.performance_metrics.cache_hit = true;
        Some(outcome)
    }

    async fn write_cache(&self, key: &str, outcome: &QueryOutcome) {
        let Ok(payload) = serde_json::to_string(outcome) else {
            return;
        };
        if let Err(err) = self
            .cache
            .set_with_ttl(key, &payload, self.cache_ttl_secs)
            .await
        {
            tracing::debug!("cache write skipped: {}", err);
        }
    }

    async fn run_sql(
        &self,
        query_text: &str,
        schema: &Schema,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<serde_json::Value>, QueryExecutionError> {
        let intent = self.extractor.extract(query_text, schema);
        let statement = self.synthesizer.synthesize(&intent, schema);
        let sql = paginate(&statement.sql, intent.limit.unwrap_or(limit), offset);
        tracing::debug!(sql = %sql, "synthesized statement");
        self.executor.execute(&sql, &statement.params).await
    }

    async fn search_documents(
        &self,
        query_text: &str,
    ) -> Result<Vec<DocumentHit>, crate::application::ports::document_search::DocumentSearchError>
    {
        let vector = self.document_search.embed(query_text).await?;
        let matches = self
            .document_search
            .nearest_neighbors(&vector, DOCUMENT_TOP_K)
            .await?;
        Ok(matches
            .into_iter()
            .map(|m| DocumentHit {
                score: m.score,
                metadata: m.metadata,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pgvector::Vector;
    use serde_json::json;

    use super::*;
    use crate::application::ports::document_search::{DocumentMatch, DocumentSearchError};
    use crate::application::ports::result_cache::ResultCacheError;
    use crate::application::ports::schema_introspector::{RawSchema, SchemaIntrospector};
    use crate::application::ports::sql_executor::BindValue;
    use crate::domain::entities::schema::{Column, ColumnTag, Relationship, Table, TableTag};

    struct StaticIntrospector;

    #[async_trait]
    impl SchemaIntrospector for StaticIntrospector {
        async fn introspect(
            &self,
            _connection_override: Option<&str>,
        ) -> Result<RawSchema, IntrospectionError> {
            Err(IntrospectionError::Unreachable("not wired in tests".into()))
        }
    }

    struct StubExecutor {
        rows: Vec<serde_json::Value>,
        fail: bool,
        seen: Mutex<Vec<(String, Vec<BindValue>)>>,
    }

    #[async_trait]
    impl SqlExecutor for StubExecutor {
        async fn execute(
            &self,
            sql: &str,
            params: &[BindValue],
        ) -> Result<Vec<serde_json::Value>, QueryExecutionError> {
            self.seen
                .lock()
                .unwrap()
                .push((sql.to_string(), params.to_vec()));
            if self.fail {
                return Err(QueryExecutionError::ExecutionError("boom".into()));
            }
            Ok(self.rows.clone())
        }
    }

    struct MapCache {
        entries: Mutex<HashMap<String, String>>,
    }

    #[async_trait]
    impl ResultCache for MapCache {
        async fn get(&self, key: &str) -> Result<Option<String>, ResultCacheError> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        async fn set_with_ttl(
            &self,
            key: &str,
            value: &str,
            _ttl_secs: u64,
        ) -> Result<(), ResultCacheError> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    struct BrokenCache;

    #[async_trait]
    impl ResultCache for BrokenCache {
        async fn get(&self, _key: &str) -> Result<Option<String>, ResultCacheError> {
            Err(ResultCacheError::BackendError("down".into()))
        }

        async fn set_with_ttl(
            &self,
            _key: &str,
            _value: &str,
            _ttl_secs: u64,
        ) -> Result<(), ResultCacheError> {
            Err(ResultCacheError::BackendError("down".into()))
        }
    }

    struct StubDocumentSearch {
        fail: bool,
    }

    #[async_trait]
    impl DocumentSearchProvider for StubDocumentSearch {
        async fn embed(&self, _text: &str) -> Result<Vector, DocumentSearchError> {
            if self.fail {
                return Err(DocumentSearchError::EmbeddingError("offline".into()));
            }
            Ok(Vector::from(vec![0.1, 0.2, 0.3]))
        }

        async fn nearest_neighbors(
            &self,
            _vector: &Vector,
            k: usize,
        ) -> Result<Vec<DocumentMatch>, DocumentSearchError> {
            Ok((0..k)
                .map(|i| DocumentMatch {
                    score: 1.0 - i as f32 * 0.1,
                    metadata: json!({"rank": i}),
                })
                .collect())
        }
    }

    fn mock_schema() -> Schema {
        let column = |name: &str, tag: ColumnTag| Column {
            name: name.to_string(),
            declared_type: "VARCHAR".to_string(),
            semantic_tag: tag,
        };
        Schema {
            tables: vec![
                Table {
                    name: "employees".to_string(),
                    columns: vec![
                        column("emp_id", ColumnTag::Identifier),
                        column("full_name", ColumnTag::Name),
                        column("annual_salary", ColumnTag::NumericMeasure),
                    ],
                    primary_key: vec!["emp_id".to_string()],
                    indexes: vec![],
                    semantic_tag: TableTag::PrimaryEntity,
                },
                Table {
                    name: "departments".to_string(),
                    columns: vec![column("dept_name", ColumnTag::Name)],
                    primary_key: vec!["dept_id".to_string()],
                    indexes: vec![],
                    semantic_tag: TableTag::OrganizationalUnit,
                },
            ],
            relationships: vec![Relationship {
                from_table: "employees".to_string(),
                from_columns: vec!["dept_id".to_string()],
                to_table: "departments".to_string(),
                to_columns: vec!["dept_id".to_string()],
            }],
            samples: BTreeMap::new(),
            vocabulary: vec![],
        }
    }

    fn orchestrator_with(
        executor: Arc<dyn SqlExecutor>,
        cache: Arc<dyn ResultCache>,
        docs: Arc<dyn DocumentSearchProvider>,
    ) -> QueryOrchestrator {
        let store = Arc::new(SchemaStore::new());
        store.replace(mock_schema());
        let discovery = Arc::new(SchemaDiscoveryService::new(Arc::new(StaticIntrospector)));
        QueryOrchestrator::new(store, discovery, executor, cache, docs, 300)
    }

    #[test]
    fn classifies_sql_documents_and_hybrid() {
        assert_eq!(classify("How many employees do we have?"), QueryType::Sql);
        assert_eq!(classify("review this pdf"), QueryType::Documents);
        assert_eq!(
            classify("resumes of employees with top salary"),
            QueryType::Hybrid
        );
        // Nothing matching either set defaults to sql.
        assert_eq!(classify("zzz"), QueryType::Sql);
    }

    #[test]
    fn cache_key_is_version_scoped_and_normalized() {
        let a = cache_key(1, "How Many Employees?", 50, 0);
        let b = cache_key(1, "  how many employees?  ", 50, 0);
        let c = cache_key(2, "How Many Employees?", 50, 0);
        let d = cache_key(1, "How Many Employees?", 50, 10);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
        // "q:" prefix plus a fixed-length sha256 hex digest.
        assert_eq!(a.len(), 2 + 64);
    }

    #[tokio::test]
    async fn miss_then_hit_round_trips_through_cache() {
        let executor = Arc::new(StubExecutor {
            rows: vec![json!({"count": 42})],
            fail: false,
            seen: Mutex::new(vec![]),
        });
        let cache = Arc::new(MapCache {
            entries: Mutex::new(HashMap::new()),
        });
        let orchestrator = orchestrator_with(
            executor.clone(),
            cache.clone(),
            Arc::new(StubDocumentSearch { fail: false }),
        );

        let first = orchestrator
            .run("How many employees do we have?", 50, 0)
            .await
            .unwrap();
        assert!(!first.performance_metrics.cache_hit);
        assert_eq!(first.results.table, Some(vec![json!({"count": 42})]));

        let second = orchestrator
            .run("How many employees do we have?", 50, 0)
            .await
            .unwrap();
        assert!(second.performance_metrics.cache_hit);
        assert_eq!(second.results.table, first.results.table);
        // The executor only ran once; the second answer came from cache.
        assert_eq!(executor.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn broken_cache_never_fails_the_request() {
        let orchestrator = orchestrator_with(
            Arc::new(StubExecutor {
                rows: vec![json!({"count": 1})],
                fail: false,
                seen: Mutex::new(vec![]),
            }),
            Arc::new(BrokenCache),
            Arc::new(StubDocumentSearch { fail: false }),
        );
        let outcome = orchestrator.run("count of staff", 50, 0).await.unwrap();
        assert!(!outcome.performance_metrics.cache_hit);
        assert!(outcome.results.table.is_some());
    }

    #[tokio::test]
    async fn hybrid_isolates_document_failure_from_sql_branch() {
        let orchestrator = orchestrator_with(
            Arc::new(StubExecutor {
                rows: vec![json!({"emp_id": 1})],
                fail: false,
                seen: Mutex::new(vec![]),
            }),
            Arc::new(MapCache {
                entries: Mutex::new(HashMap::new()),
            }),
            Arc::new(StubDocumentSearch { fail: true }),
        );
        let outcome = orchestrator
            .run("resumes of employees with top salary", 50, 0)
            .await
            .unwrap();
        assert_eq!(outcome.query_type, QueryType::Hybrid);
        assert!(outcome.results.table.is_some());
        assert!(outcome.results.documents.is_none());
        assert!(outcome.results.documents_error.is_some());
    }

    #[tokio::test]
    async fn hybrid_isolates_sql_failure_from_document_branch() {
        let orchestrator = orchestrator_with(
            Arc::new(StubExecutor {
                rows: vec![],
                fail: true,
                seen: Mutex::new(vec![]),
            }),
            Arc::new(MapCache {
                entries: Mutex::new(HashMap::new()),
            }),
            Arc::new(StubDocumentSearch { fail: false }),
        );
        let outcome = orchestrator
            .run("resumes of employees with top salary", 50, 0)
            .await
            .unwrap();
        assert!(outcome.results.table.is_none());
        assert!(outcome.results.table_error.is_some());
        assert_eq!(outcome.results.documents.as_ref().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn pure_sql_failure_surfaces_as_execution_error() {
        let orchestrator = orchestrator_with(
            Arc::new(StubExecutor {
                rows: vec![],
                fail: true,
                seen: Mutex::new(vec![]),
            }),
            Arc::new(MapCache {
                entries: Mutex::new(HashMap::new()),
            }),
            Arc::new(StubDocumentSearch { fail: false }),
        );
        let err = orchestrator
            .run("How many employees do we have?", 50, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Execution(_)));
    }

    #[tokio::test]
    async fn pagination_is_appended_exactly_once() {
        let executor = Arc::new(StubExecutor {
            rows: vec![],
            fail: false,
            seen: Mutex::new(vec![]),
        });
        let orchestrator = orchestrator_with(
            executor.clone(),
            Arc::new(MapCache {
                entries: Mutex::new(HashMap::new()),
            }),
            Arc::new(StubDocumentSearch { fail: false }),
        );
        orchestrator
            .run("How many employees do we have?", 1000, -4)
            .await
            .unwrap();
        let seen = executor.seen.lock().unwrap();
        let (sql, _) = &seen[0];
        assert!(sql.ends_with("LIMIT 200 OFFSET 0"));
        assert_eq!(sql.to_uppercase().matches(" LIMIT ").count(), 1);
    }
}
