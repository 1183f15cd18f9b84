pub mod intent;
pub mod query_outcome;
pub mod schema;

pub use intent::Intent;
pub use query_outcome::{DocumentHit, PerformanceMetrics, QueryOutcome, QueryResults, QueryType};
pub use schema::{Column, ColumnTag, Relationship, Schema, Table, TableTag};
