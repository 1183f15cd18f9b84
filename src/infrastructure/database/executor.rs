use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};

use crate::application::ports::sql_executor::{BindValue, QueryExecutionError, SqlExecutor};
use crate::infrastructure::database::connection::{DbPool, get_connection_from_pool};

#[derive(QueryableByName)]
struct JsonRow {
    #[diesel(sql_type = diesel::sql_types::Json)]
    row_json: serde_json::Value,
}

/// Runs synthesized statements against Postgres. Result shapes vary per
/// query, so every statement is wrapped in `row_to_json` and each row comes
/// back as a JSON object keyed by column name.
pub struct PostgresSqlExecutor {
    pool: DbPool,
    statement_timeout_ms: u64,
}

impl PostgresSqlExecutor {
    pub fn new(pool: DbPool, statement_timeout_ms: u64) -> Self {
        Self {
            pool,
            statement_timeout_ms,
        }
    }
}

#[async_trait]
impl SqlExecutor for PostgresSqlExecutor {
    async fn execute(
        &self,
        sql: &str,
        params: &[BindValue],
    ) -> Result<Vec<serde_json::Value>, QueryExecutionError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| QueryExecutionError::PoolError(e.to_string()))?;

        diesel::sql_query(format!("SET statement_timeout = {}", self.statement_timeout_ms))
            .execute(&mut conn)
            .map_err(|e| QueryExecutionError::ExecutionError(e.to_string()))?;

        let wrapped = format!("SELECT row_to_json(_sub) AS row_json FROM ({}) AS _sub", sql);

        let mut query = diesel::sql_query(wrapped).into_boxed::<Pg>();
        for param in params {
            query = match param {
                BindValue::Int(v) => query.bind::<BigInt, _>(*v),
                BindValue::Text(s) => query.bind::<Text, _>(s.clone()),
            };
        }

        let rows = query
            .load::<JsonRow>(&mut conn)
            .map_err(|e| QueryExecutionError::ExecutionError(e.to_string()))?;

        Ok(rows.into_iter().map(|row| row.row_json).collect())
    }
}
