use async_trait::async_trait;

#[derive(Debug)]
pub enum QueryExecutionError {
    PoolError(String),
    ExecutionError(String),
}

impl std::fmt::Display for QueryExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryExecutionError::PoolError(msg) => write!(f, "Connection pool error: {}", msg),
            QueryExecutionError::ExecutionError(msg) => write!(f, "Query execution error: {}", msg),
        }
    }
}

impl std::error::Error for QueryExecutionError {}

/// A value bound to a positional `$N` placeholder. Only parameter values
/// ever come from user text; identifiers are always schema-derived.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Int(i64),
    Text(String),
}

#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Execute a parameterized statement and return each row as an ordered
    /// column-name-to-value JSON mapping.
    async fn execute(
        &self,
        sql: &str,
        params: &[BindValue],
    ) -> Result<Vec<serde_json::Value>, QueryExecutionError>;
}
