use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Semantic role of a table, inferred from structural signals only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableTag {
    PrimaryEntity,
    OrganizationalUnit,
    DocumentStore,
    Auxiliary,
}

/// Semantic role of a column, inferred from its name and declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnTag {
    Identifier,
    Name,
    NumericMeasure,
    Numeric,
    Date,
    Location,
    TextContent,
    Text,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub declared_type: String,
    pub semantic_tag: ColumnTag,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
    pub indexes: Vec<IndexDescriptor>,
    pub semantic_tag: TableTag,
}

impl Table {
    pub fn first_column_tagged(&self, tag: ColumnTag) -> Option<&Column> {
        self.columns.iter().find(|c| c.semantic_tag == tag)
    }

    /// First column whose name contains "name", regardless of its tag. The
    /// reports-to lookup matches people by this column even when a title or
    /// label column stole the `name` tag.
    pub fn name_like_column(&self) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.to_lowercase().contains("name"))
    }
}

/// Directed foreign-key edge between two tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub from_table: String,
    pub from_columns: Vec<String>,
    pub to_table: String,
    pub to_columns: Vec<String>,
}

/// Immutable snapshot of a discovered database. Replaced wholesale on
/// re-ingest; readers always see a complete snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
    /// Bounded row sample per table, kept for future inference heuristics.
    pub samples: BTreeMap<String, Vec<serde_json::Value>>,
    /// Table and column names (original and lowercased) for autocomplete.
    pub vocabulary: Vec<String>,
}

impl Schema {
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn first_table_tagged(&self, tag: TableTag) -> Option<&Table> {
        self.tables.iter().find(|t| t.semantic_tag == tag)
    }

    pub fn primary_entity_table(&self) -> Option<&Table> {
        self.first_table_tagged(TableTag::PrimaryEntity)
    }

    pub fn organizational_unit_table(&self) -> Option<&Table> {
        self.first_table_tagged(TableTag::OrganizationalUnit)
    }

    /// First foreign-key edge from `from_table` to `to_table`. Multiple
    /// candidate paths are resolved by first match with no disambiguation.
    pub fn relationship_between(&self, from_table: &str, to_table: &str) -> Option<&Relationship> {
        self.relationships
            .iter()
            .find(|r| r.from_table == from_table && r.to_table == to_table)
    }
}
