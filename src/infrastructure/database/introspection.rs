use std::collections::BTreeMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::Text;

use crate::application::ports::schema_introspector::{
    IntrospectionError, RawColumn, RawIndex, RawRelationship, RawSchema, RawTable,
    SchemaIntrospector,
};
use crate::application::services::sql_synthesizer::quote_ident;
use crate::infrastructure::database::connection::{
    DbPool, establish_connection, get_connection_from_pool,
};

/// Bounds on the row sample carried in a snapshot.
const SAMPLE_TABLE_LIMIT: usize = 10;
const SAMPLE_ROW_LIMIT: usize = 5;

#[derive(QueryableByName)]
struct TableNameRow {
    #[diesel(sql_type = Text)]
    table_name: String,
}

#[derive(QueryableByName)]
struct ColumnRow {
    #[diesel(sql_type = Text)]
    column_name: String,
    #[diesel(sql_type = Text)]
    data_type: String,
}

#[derive(QueryableByName)]
struct PrimaryKeyRow {
    #[diesel(sql_type = Text)]
    column_name: String,
}

#[derive(QueryableByName)]
struct ForeignKeyRow {
    #[diesel(sql_type = Text)]
    constraint_name: String,
    #[diesel(sql_type = Text)]
    column_name: String,
    #[diesel(sql_type = Text)]
    foreign_table_name: String,
    #[diesel(sql_type = Text)]
    foreign_column_name: String,
}

#[derive(QueryableByName)]
struct IndexRow {
    #[diesel(sql_type = Text)]
    indexname: String,
    #[diesel(sql_type = Text)]
    indexdef: String,
}

#[derive(QueryableByName)]
struct JsonRow {
    #[diesel(sql_type = diesel::sql_types::Json)]
    row_json: serde_json::Value,
}

/// Postgres implementation of the introspection port, built on
/// `information_schema` and `pg_indexes`. All-or-nothing: the first failure
/// aborts the whole snapshot.
pub struct PostgresIntrospector {
    pool: DbPool,
}

impl PostgresIntrospector {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaIntrospector for PostgresIntrospector {
    async fn introspect(
        &self,
        connection_override: Option<&str>,
    ) -> Result<RawSchema, IntrospectionError> {
        match connection_override {
            Some(url) => {
                let mut conn = establish_connection(url)
                    .map_err(|e| IntrospectionError::Unreachable(e.to_string()))?;
                introspect_connection(&mut conn)
            }
            None => {
                let mut conn = get_connection_from_pool(&self.pool)
                    .map_err(|e| IntrospectionError::Unreachable(e.to_string()))?;
                introspect_connection(&mut conn)
            }
        }
    }
}

fn introspect_connection(conn: &mut PgConnection) -> Result<RawSchema, IntrospectionError> {
    let table_names: Vec<String> = diesel::sql_query(
        "SELECT table_name FROM information_schema.tables \
         WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
         ORDER BY table_name",
    )
    .load::<TableNameRow>(conn)
    .map_err(map_introspection_error)?
    .into_iter()
    .map(|row| row.table_name)
    .collect();

    let mut tables = Vec::with_capacity(table_names.len());
    let mut relationships = Vec::new();

    for name in &table_names {
        tables.push(RawTable {
            name: name.clone(),
            columns: fetch_columns(conn, name)?,
            primary_key: fetch_primary_key(conn, name)?,
            indexes: fetch_indexes(conn, name)?,
        });
        relationships.extend(fetch_foreign_keys(conn, name)?);
    }

    let mut samples = BTreeMap::new();
    for name in table_names.iter().take(SAMPLE_TABLE_LIMIT) {
        samples.insert(name.clone(), fetch_sample_rows(conn, name)?);
    }

    Ok(RawSchema {
        tables,
        relationships,
        samples,
    })
}

fn fetch_columns(conn: &mut PgConnection, table: &str) -> Result<Vec<RawColumn>, IntrospectionError> {
    let rows = diesel::sql_query(
        "SELECT column_name, data_type FROM information_schema.columns \
         WHERE table_schema = 'public' AND table_name = $1 \
         ORDER BY ordinal_position",
    )
    .bind::<Text, _>(table)
    .load::<ColumnRow>(conn)
    .map_err(map_introspection_error)?;

    Ok(rows
        .into_iter()
        .map(|row| RawColumn {
            name: row.column_name,
            declared_type: row.data_type,
        })
        .collect())
}

fn fetch_primary_key(
    conn: &mut PgConnection,
    table: &str,
) -> Result<Vec<String>, IntrospectionError> {
    let rows = diesel::sql_query(
        "SELECT kcu.column_name \
         FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage kcu \
           ON tc.constraint_name = kcu.constraint_name \
          AND tc.table_schema = kcu.table_schema \
         WHERE tc.constraint_type = 'PRIMARY KEY' \
           AND tc.table_schema = 'public' AND tc.table_name = $1 \
         ORDER BY kcu.ordinal_position",
    )
    .bind::<Text, _>(table)
    .load::<PrimaryKeyRow>(conn)
    .map_err(map_introspection_error)?;

    Ok(rows.into_iter().map(|row| row.column_name).collect())
}

fn fetch_foreign_keys(
    conn: &mut PgConnection,
    table: &str,
) -> Result<Vec<RawRelationship>, IntrospectionError> {
    let rows = diesel::sql_query(
        "SELECT tc.constraint_name, kcu.column_name, \
                ccu.table_name AS foreign_table_name, \
                ccu.column_name AS foreign_column_name \
         FROM information_schema.table_constraints tc \
         JOIN information_schema.key_column_usage kcu \
           ON tc.constraint_name = kcu.constraint_name \
          AND tc.table_schema = kcu.table_schema \
         JOIN information_schema.constraint_column_usage ccu \
           ON tc.constraint_name = ccu.constraint_name \
          AND tc.table_schema = ccu.table_schema \
         WHERE tc.constraint_type = 'FOREIGN KEY' \
           AND tc.table_schema = 'public' AND tc.table_name = $1 \
         ORDER BY tc.constraint_name, kcu.ordinal_position",
    )
    .bind::<Text, _>(table)
    .load::<ForeignKeyRow>(conn)
    .map_err(map_introspection_error)?;

    // Multi-column constraints arrive as one row per column pair; fold them
    // back into a single edge per constraint.
    let mut relationships: Vec<(String, RawRelationship)> = Vec::new();
    for row in rows {
        match relationships
            .iter_mut()
            .find(|(name, _)| *name == row.constraint_name)
        {
            Some((_, rel)) => {
                rel.from_columns.push(row.column_name);
                rel.to_columns.push(row.foreign_column_name);
            }
            None => relationships.push((
                row.constraint_name,
                RawRelationship {
                    from_table: table.to_string(),
                    from_columns: vec![row.column_name],
                    to_table: row.foreign_table_name,
                    to_columns: vec![row.foreign_column_name],
                },
            )),
        }
    }

    Ok(relationships.into_iter().map(|(_, rel)| rel).collect())
}

fn fetch_indexes(conn: &mut PgConnection, table: &str) -> Result<Vec<RawIndex>, IntrospectionError> {
    let rows = diesel::sql_query(
        "SELECT indexname, indexdef FROM pg_indexes \
         WHERE schemaname = 'public' AND tablename = $1 \
         ORDER BY indexname",
    )
    .bind::<Text, _>(table)
    .load::<IndexRow>(conn)
    .map_err(map_introspection_error)?;

    Ok(rows
        .into_iter()
        .map(|row| RawIndex {
            columns: index_columns(&row.indexdef),
            name: row.indexname,
        })
        .collect())
}

/// Column list out of an index definition, e.g.
/// `CREATE INDEX idx ON t USING btree (a, b)` yields `[a, b]`.
fn index_columns(indexdef: &str) -> Vec<String> {
    let Some(open) = indexdef.find('(') else {
        return Vec::new();
    };
    let Some(close) = indexdef.rfind(')') else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    indexdef[open + 1..close]
        .split(',')
        .map(|col| col.trim().trim_matches('"').to_string())
        .filter(|col| !col.is_empty())
        .collect()
}

fn fetch_sample_rows(
    conn: &mut PgConnection,
    table: &str,
) -> Result<Vec<serde_json::Value>, IntrospectionError> {
    let sql = format!(
        "SELECT row_to_json(_sample) AS row_json FROM {} _sample LIMIT {}",
        quote_ident(table),
        SAMPLE_ROW_LIMIT
    );
    let rows = diesel::sql_query(sql)
        .load::<JsonRow>(conn)
        .map_err(map_introspection_error)?;
    Ok(rows.into_iter().map(|row| row.row_json).collect())
}

fn map_introspection_error(err: diesel::result::Error) -> IntrospectionError {
    let message = err.to_string();
    if message.contains("permission denied") {
        IntrospectionError::Denied(message)
    } else {
        IntrospectionError::Introspection(message)
    }
}
