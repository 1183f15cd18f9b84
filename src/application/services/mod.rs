pub mod intent_extractor;
pub mod query_history;
pub mod query_orchestrator;
pub mod schema_discovery;
pub mod schema_store;
pub mod sql_synthesizer;

pub use intent_extractor::IntentExtractor;
pub use query_history::QueryHistory;
pub use query_orchestrator::QueryOrchestrator;
pub use schema_discovery::SchemaDiscoveryService;
pub use schema_store::SchemaStore;
pub use sql_synthesizer::SqlSynthesizer;
