use std::collections::BTreeMap;

use async_trait::async_trait;

#[derive(Debug)]
pub enum IntrospectionError {
    Unreachable(String),
    Denied(String),
    Introspection(String),
}

impl std::fmt::Display for IntrospectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntrospectionError::Unreachable(msg) => write!(f, "Database unreachable: {}", msg),
            IntrospectionError::Denied(msg) => write!(f, "Introspection denied: {}", msg),
            IntrospectionError::Introspection(msg) => write!(f, "Introspection failed: {}", msg),
        }
    }
}

impl std::error::Error for IntrospectionError {}

/// Untagged structural facts about one table, exactly as reported by the
/// database. Semantic tagging happens in the discovery service.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub name: String,
    pub columns: Vec<RawColumn>,
    pub primary_key: Vec<String>,
    pub indexes: Vec<RawIndex>,
}

#[derive(Debug, Clone)]
pub struct RawColumn {
    pub name: String,
    pub declared_type: String,
}

#[derive(Debug, Clone)]
pub struct RawIndex {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RawRelationship {
    pub from_table: String,
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_columns: Vec<String>,
}

/// Complete introspection result. All-or-nothing: an implementation must
/// never return a partially populated snapshot.
#[derive(Debug, Clone)]
pub struct RawSchema {
    pub tables: Vec<RawTable>,
    pub relationships: Vec<RawRelationship>,
    pub samples: BTreeMap<String, Vec<serde_json::Value>>,
}

#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Enumerate tables, columns, keys, indexes and a bounded row sample.
    /// `connection_override` introspects a different database than the one
    /// the service was started against.
    async fn introspect(
        &self,
        connection_override: Option<&str>,
    ) -> Result<RawSchema, IntrospectionError>;
}
