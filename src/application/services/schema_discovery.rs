use std::collections::BTreeSet;
use std::sync::Arc;

use crate::application::ports::schema_introspector::{
    IntrospectionError, RawColumn, RawSchema, RawTable, SchemaIntrospector,
};
use crate::domain::entities::schema::{
    Column, ColumnTag, IndexDescriptor, Relationship, Schema, Table, TableTag,
};

const ENTITY_INDICATORS: &[&str] = &[
    "name", "email", "phone", "address", "salary", "wage", "pay", "hire", "join", "start", "birth",
    "age",
];
const ORG_TABLE_INDICATORS: &[&str] = &["dept", "div", "team", "group", "unit", "branch"];
const ORG_COLUMN_INDICATORS: &[&str] = &["manager", "head", "lead", "director"];
const DOC_INDICATORS: &[&str] = &["doc", "file", "pdf", "content", "text", "upload"];

const IDENTIFIER_MARKERS: &[&str] = &["_id", "id_", "code", "key"];
const NAME_MARKERS: &[&str] = &["name", "title", "label"];
const MEASURE_MARKERS: &[&str] = &[
    "salary", "pay", "wage", "compensation", "amount", "cost", "price", "total", "sum", "count",
    "quantity",
];
const LOCATION_MARKERS: &[&str] = &[
    "location", "city", "state", "country", "address", "office", "site", "place",
];
const CONTENT_MARKERS: &[&str] = &["content", "description", "note", "comment", "text"];

const NUMERIC_TYPES: &[&str] = &[
    "numeric", "decimal", "float", "money", "integer", "bigint", "smallint", "double", "real",
];
const TEMPORAL_TYPES: &[&str] = &["date", "time", "timestamp"];
const TEXTUAL_TYPES: &[&str] = &["text", "varchar", "char"];

/// Builds semantically tagged schema snapshots from raw introspection data.
/// Tagging is a pure function of structural signals: identical input always
/// yields identical tags.
pub struct SchemaDiscoveryService {
    introspector: Arc<dyn SchemaIntrospector>,
}

impl SchemaDiscoveryService {
    pub fn new(introspector: Arc<dyn SchemaIntrospector>) -> Self {
        Self { introspector }
    }

    pub async fn discover(
        &self,
        connection_override: Option<&str>,
    ) -> Result<Schema, IntrospectionError> {
        let raw = self.introspector.introspect(connection_override).await?;
        Ok(tag_schema(raw))
    }
}

pub fn tag_schema(raw: RawSchema) -> Schema {
    let vocabulary = build_vocabulary(&raw);

    let tables = raw
        .tables
        .into_iter()
        .map(|table| {
            let table_tag = infer_table_tag(&table);
            let primary_key = table.primary_key;
            let columns = table
                .columns
                .into_iter()
                .map(|column| {
                    let tag = infer_column_tag(&column, &primary_key);
                    Column {
                        name: column.name,
                        declared_type: column.declared_type,
                        semantic_tag: tag,
                    }
                })
                .collect();
            Table {
                name: table.name,
                columns,
                primary_key,
                indexes: table
                    .indexes
                    .into_iter()
                    .map(|idx| IndexDescriptor {
                        name: idx.name,
                        columns: idx.columns,
                    })
                    .collect(),
                semantic_tag: table_tag,
            }
        })
        .collect();

    let relationships = raw
        .relationships
        .into_iter()
        .map(|rel| Relationship {
            from_table: rel.from_table,
            from_columns: rel.from_columns,
            to_table: rel.to_table,
            to_columns: rel.to_columns,
        })
        .collect();

    Schema {
        tables,
        relationships,
        samples: raw.samples,
        vocabulary,
    }
}

/// Score-based table classification. Resolution order: primary entity first
/// (when its score also beats the org score), then organizational unit, then
/// document store, with auxiliary as the explicit fallthrough.
pub fn infer_table_tag(table: &RawTable) -> TableTag {
    let table_name = table.name.to_lowercase();
    let columns: Vec<String> = table
        .columns
        .iter()
        .map(|c| c.name.to_lowercase())
        .collect();

    let entity_score = ENTITY_INDICATORS
        .iter()
        .filter(|indicator| columns.iter().any(|col| col.contains(*indicator)))
        .count();

    let mut org_score = 0;
    if ORG_TABLE_INDICATORS
        .iter()
        .any(|indicator| table_name.contains(indicator))
    {
        org_score += 3;
    }
    if ORG_COLUMN_INDICATORS
        .iter()
        .any(|indicator| columns.iter().any(|col| col.contains(indicator)))
    {
        org_score += 2;
    }

    let mut doc_score = 0;
    if DOC_INDICATORS
        .iter()
        .any(|indicator| table_name.contains(indicator))
    {
        doc_score += 2;
    }
    if DOC_INDICATORS
        .iter()
        .any(|indicator| columns.iter().any(|col| col.contains(indicator)))
    {
        doc_score += 1;
    }

    if entity_score >= 3 && entity_score > org_score {
        TableTag::PrimaryEntity
    } else if org_score >= 3 {
        TableTag::OrganizationalUnit
    } else if doc_score >= 2 {
        TableTag::DocumentStore
    } else {
        TableTag::Auxiliary
    }
}

/// Priority-ordered column classification: identifier, name, numeric,
/// temporal, location, textual, generic. The first matching rung wins.
pub fn infer_column_tag(column: &RawColumn, primary_key: &[String]) -> ColumnTag {
    let col_name = column.name.to_lowercase();
    let col_type = column.declared_type.to_lowercase();

    if primary_key.iter().any(|pk| *pk == column.name) {
        return ColumnTag::Identifier;
    }
    if IDENTIFIER_MARKERS.iter().any(|m| col_name.contains(m)) {
        return ColumnTag::Identifier;
    }

    if NAME_MARKERS.iter().any(|m| col_name.contains(m)) {
        return ColumnTag::Name;
    }

    if NUMERIC_TYPES.iter().any(|t| col_type.contains(t)) {
        if MEASURE_MARKERS.iter().any(|m| col_name.contains(m)) {
            return ColumnTag::NumericMeasure;
        }
        return ColumnTag::Numeric;
    }

    if TEMPORAL_TYPES.iter().any(|t| col_type.contains(t)) {
        return ColumnTag::Date;
    }

    if LOCATION_MARKERS.iter().any(|m| col_name.contains(m)) {
        return ColumnTag::Location;
    }

    if TEXTUAL_TYPES.iter().any(|t| col_type.contains(t)) {
        if CONTENT_MARKERS.iter().any(|m| col_name.contains(m)) {
            return ColumnTag::TextContent;
        }
        return ColumnTag::Text;
    }

    ColumnTag::Generic
}

/// Flat vocabulary of table and column names (original and lowercased),
/// sorted so snapshots compare deterministically.
pub fn build_vocabulary(raw: &RawSchema) -> Vec<String> {
    let mut vocab = BTreeSet::new();
    for table in &raw.tables {
        vocab.insert(table.name.clone());
        vocab.insert(table.name.to_lowercase());
        for column in &table.columns {
            vocab.insert(column.name.clone());
            vocab.insert(column.name.to_lowercase());
        }
    }
    vocab.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::application::ports::schema_introspector::RawRelationship;

    fn raw_column(name: &str, declared_type: &str) -> RawColumn {
        RawColumn {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
        }
    }

    fn raw_table(name: &str, columns: Vec<RawColumn>, primary_key: Vec<&str>) -> RawTable {
        RawTable {
            name: name.to_string(),
            columns,
            primary_key: primary_key.into_iter().map(String::from).collect(),
            indexes: vec![],
        }
    }

    fn employees_raw() -> RawTable {
        raw_table(
            "employees",
            vec![
                raw_column("emp_id", "INTEGER"),
                raw_column("full_name", "VARCHAR"),
                raw_column("email", "VARCHAR"),
                raw_column("phone", "VARCHAR"),
                raw_column("annual_salary", "NUMERIC"),
                raw_column("join_date", "DATE"),
                raw_column("office_location", "VARCHAR"),
            ],
            vec!["emp_id"],
        )
    }

    #[test]
    fn employee_like_table_is_primary_entity() {
        assert_eq!(infer_table_tag(&employees_raw()), TableTag::PrimaryEntity);
    }

    #[test]
    fn dept_table_is_organizational_unit() {
        let table = raw_table(
            "departments",
            vec![
                raw_column("dept_id", "INTEGER"),
                raw_column("dept_name", "VARCHAR"),
                raw_column("manager_id", "INTEGER"),
            ],
            vec!["dept_id"],
        );
        assert_eq!(infer_table_tag(&table), TableTag::OrganizationalUnit);
    }

    #[test]
    fn upload_table_is_document_store() {
        let table = raw_table(
            "uploads",
            vec![
                raw_column("upload_id", "INTEGER"),
                raw_column("body", "TEXT"),
            ],
            vec!["upload_id"],
        );
        assert_eq!(infer_table_tag(&table), TableTag::DocumentStore);
    }

    #[test]
    fn unrecognized_table_is_auxiliary() {
        let table = raw_table(
            "audit_entries",
            vec![raw_column("seq", "INTEGER")],
            vec!["seq"],
        );
        assert_eq!(infer_table_tag(&table), TableTag::Auxiliary);
    }

    #[test]
    fn entity_score_must_beat_org_score() {
        // name + manager-ish columns inside a dept-named table: the org
        // table-name bonus holds it at organizational_unit.
        let table = raw_table(
            "dept_roster",
            vec![
                raw_column("name", "VARCHAR"),
                raw_column("email", "VARCHAR"),
                raw_column("manager", "VARCHAR"),
            ],
            vec![],
        );
        assert_eq!(infer_table_tag(&table), TableTag::OrganizationalUnit);
    }

    #[test]
    fn primary_key_column_is_identifier() {
        let col = raw_column("serial", "INTEGER");
        assert_eq!(
            infer_column_tag(&col, &["serial".to_string()]),
            ColumnTag::Identifier
        );
    }

    #[test]
    fn id_marker_beats_name_marker() {
        // "key" marker outranks everything after the primary key check.
        let col = raw_column("name_key", "VARCHAR");
        assert_eq!(infer_column_tag(&col, &[]), ColumnTag::Identifier);
    }

    #[test]
    fn column_tag_priorities() {
        assert_eq!(
            infer_column_tag(&raw_column("full_name", "VARCHAR"), &[]),
            ColumnTag::Name
        );
        assert_eq!(
            infer_column_tag(&raw_column("annual_salary", "NUMERIC"), &[]),
            ColumnTag::NumericMeasure
        );
        assert_eq!(
            infer_column_tag(&raw_column("age_years", "INTEGER"), &[]),
            ColumnTag::Numeric
        );
        assert_eq!(
            infer_column_tag(&raw_column("join_date", "DATE"), &[]),
            ColumnTag::Date
        );
        assert_eq!(
            infer_column_tag(&raw_column("hired_at", "timestamp without time zone"), &[]),
            ColumnTag::Date
        );
        assert_eq!(
            infer_column_tag(&raw_column("office_location", "VARCHAR"), &[]),
            ColumnTag::Location
        );
        assert_eq!(
            infer_column_tag(&raw_column("description", "TEXT"), &[]),
            ColumnTag::TextContent
        );
        assert_eq!(
            infer_column_tag(&raw_column("nickname_unused", "bytea"), &[]),
            ColumnTag::Name
        );
        assert_eq!(
            infer_column_tag(&raw_column("blob", "bytea"), &[]),
            ColumnTag::Generic
        );
    }

    #[test]
    fn plain_varchar_is_text() {
        assert_eq!(
            infer_column_tag(&raw_column("remarks_free", "character varying"), &[]),
            ColumnTag::Text
        );
    }

    #[test]
    fn tagging_is_deterministic() {
        let raw = || RawSchema {
            tables: vec![employees_raw()],
            relationships: vec![RawRelationship {
                from_table: "employees".to_string(),
                from_columns: vec!["dept_id".to_string()],
                to_table: "departments".to_string(),
                to_columns: vec!["dept_id".to_string()],
            }],
            samples: BTreeMap::new(),
        };
        let first = tag_schema(raw());
        let second = tag_schema(raw());
        assert_eq!(first, second);
    }

    #[test]
    fn every_column_gets_exactly_one_tag() {
        let schema = tag_schema(RawSchema {
            tables: vec![employees_raw()],
            relationships: vec![],
            samples: BTreeMap::new(),
        });
        assert_eq!(schema.tables[0].columns.len(), 7);
    }

    #[test]
    fn vocabulary_holds_original_and_lowercased_names() {
        let raw = RawSchema {
            tables: vec![raw_table(
                "Employees",
                vec![raw_column("FullName", "VARCHAR")],
                vec![],
            )],
            relationships: vec![],
            samples: BTreeMap::new(),
        };
        let vocab = build_vocabulary(&raw);
        assert!(vocab.contains(&"Employees".to_string()));
        assert!(vocab.contains(&"employees".to_string()));
        assert!(vocab.contains(&"FullName".to_string()));
        assert!(vocab.contains(&"fullname".to_string()));
    }
}
