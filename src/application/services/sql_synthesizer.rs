use crate::application::ports::sql_executor::BindValue;
use crate::domain::entities::Schema;
use crate::domain::entities::intent::{
    AggregateFunction, Aggregation, Filter, FilterPredicate, Grouping, Intent, Operation,
    YearReference,
};
use crate::domain::entities::schema::{ColumnTag, Table, TableTag};

/// Hard bounds on caller-supplied pagination.
const MAX_PAGE_LIMIT: i64 = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl SqlStatement {
    fn bare(sql: String) -> Self {
        Self {
            sql,
            params: Vec::new(),
        }
    }
}

/// Quote an identifier for SQL text. The single place identifiers enter a
/// statement; only schema-derived strings may pass through here.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Append LIMIT/OFFSET unless the statement already carries a LIMIT clause,
/// clamping the limit to [1, 200] and the offset to >= 0.
pub fn paginate(sql: &str, limit: i64, offset: i64) -> String {
    if sql.to_uppercase().contains(" LIMIT ") {
        return sql.to_string();
    }
    let limit = limit.clamp(1, MAX_PAGE_LIMIT);
    let offset = offset.max(0);
    format!("{} LIMIT {} OFFSET {}", sql, limit, offset)
}

/// Compiles an Intent plus a schema snapshot into one parameterized SQL
/// statement. Never fails: every branch falls back to a simpler, always-valid
/// statement when the schema elements it needs are missing. Branch precedence,
/// highest first: reports_to, window function, COUNT, AGGREGATE, LIST.
pub struct SqlSynthesizer;

impl SqlSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn synthesize(&self, intent: &Intent, schema: &Schema) -> SqlStatement {
        let Some(entity_table) = intent.target_tables.first() else {
            // Snapshot has no tables at all; emit a valid empty result.
            return SqlStatement::bare("SELECT 1 AS placeholder WHERE FALSE".to_string());
        };

        if let Some(person) = &intent.reports_to {
            return self.build_reports_to(person, entity_table, schema);
        }
        if let Some(window) = &intent.window_function {
            return self.build_window(intent, window.limit, entity_table, schema);
        }
        match intent.operation {
            Operation::Count => self.build_count(intent, entity_table),
            Operation::Aggregate => self.build_aggregate(intent, entity_table, schema),
            Operation::List => self.build_list(intent, entity_table, schema),
        }
    }

    /// Peers of a named person: rows sharing the person's foreign key into
    /// the organizational-unit table, excluding the person. Falls back to an
    /// unfiltered select when the join or name columns cannot be located.
    fn build_reports_to(&self, person: &str, entity_table: &str, schema: &Schema) -> SqlStatement {
        let fallback = || SqlStatement::bare(format!("SELECT * FROM {}", quote_ident(entity_table)));

        let Some(org_table) = schema.organizational_unit_table() else {
            return fallback();
        };
        let Some(edge) = schema.relationship_between(entity_table, &org_table.name) else {
            return fallback();
        };
        let (Some(fk_from), Some(fk_to)) = (edge.from_columns.first(), edge.to_columns.first())
        else {
            return fallback();
        };
        let name_col = schema
            .table(entity_table)
            .and_then(|t| t.name_like_column());
        let org_name_col = org_table.first_column_tagged(ColumnTag::Name);
        let (Some(name_col), Some(org_name_col)) = (name_col, org_name_col) else {
            return fallback();
        };

        let sql = format!(
            "SELECT e.*, o.{org_name} AS department \
             FROM {entity} e \
             LEFT JOIN {org} o ON e.{fk_from} = o.{fk_to} \
             WHERE e.{fk_from} = (SELECT {fk_from} FROM {entity} WHERE {name} ILIKE $1 LIMIT 1) \
             AND e.{name} NOT ILIKE $1 \
             ORDER BY e.{name}",
            org_name = quote_ident(&org_name_col.name),
            entity = quote_ident(entity_table),
            org = quote_ident(&org_table.name),
            fk_from = quote_ident(fk_from),
            fk_to = quote_ident(fk_to),
            name = quote_ident(&name_col.name),
        );
        SqlStatement {
            sql,
            params: vec![BindValue::Text(format!("%{}%", person))],
        }
    }

    /// Top N per organizational unit via a ROW_NUMBER ranking subquery.
    /// Missing join or measure columns degrade to the LIST branch.
    fn build_window(
        &self,
        intent: &Intent,
        window_limit: i64,
        entity_table: &str,
        schema: &Schema,
    ) -> SqlStatement {
        let Some(org_table) = schema.organizational_unit_table() else {
            return self.build_list(intent, entity_table, schema);
        };
        let Some(edge) = schema.relationship_between(entity_table, &org_table.name) else {
            return self.build_list(intent, entity_table, schema);
        };
        let (Some(fk_from), Some(fk_to)) = (edge.from_columns.first(), edge.to_columns.first())
        else {
            return self.build_list(intent, entity_table, schema);
        };
        let org_name_col = org_table.first_column_tagged(ColumnTag::Name);
        let measure_col = schema
            .table(entity_table)
            .and_then(|t| t.first_column_tagged(ColumnTag::NumericMeasure));
        let (Some(org_name_col), Some(measure_col)) = (org_name_col, measure_col) else {
            return self.build_list(intent, entity_table, schema);
        };

        let sql = format!(
            "WITH ranked AS (\
             SELECT e.*, o.{org_name} AS department, \
             ROW_NUMBER() OVER (PARTITION BY e.{fk_from} ORDER BY e.{measure} DESC) AS rn \
             FROM {entity} e \
             LEFT JOIN {org} o ON e.{fk_from} = o.{fk_to}\
             ) SELECT * FROM ranked WHERE rn <= {limit} ORDER BY department, rn",
            org_name = quote_ident(&org_name_col.name),
            fk_from = quote_ident(fk_from),
            measure = quote_ident(&measure_col.name),
            entity = quote_ident(entity_table),
            org = quote_ident(&org_table.name),
            fk_to = quote_ident(fk_to),
            limit = window_limit,
        );
        SqlStatement::bare(sql)
    }

    fn build_count(&self, intent: &Intent, entity_table: &str) -> SqlStatement {
        let mut params = Vec::new();
        let mut sql = format!("SELECT COUNT(*) as count FROM {}", quote_ident(entity_table));
        if !intent.filters.is_empty() {
            let clause = build_where(&intent.filters, None, &mut params);
            sql.push_str(&format!(" WHERE {}", clause));
        }
        SqlStatement { sql, params }
    }

    fn build_aggregate(&self, intent: &Intent, entity_table: &str, schema: &Schema) -> SqlStatement {
        let Some(aggregation) = &intent.aggregation else {
            return self.build_list(intent, entity_table, schema);
        };
        let agg_expr = aggregate_expression(aggregation);
        let ungrouped = || {
            SqlStatement::bare(format!(
                "SELECT {} AS aggregate_value FROM {}",
                agg_expr,
                quote_ident(entity_table)
            ))
        };

        match intent.grouping {
            Some(Grouping::Org) => {
                let Some(org_table) = schema.organizational_unit_table() else {
                    return ungrouped();
                };
                let Some(edge) = schema.relationship_between(entity_table, &org_table.name) else {
                    return ungrouped();
                };
                let (Some(fk_from), Some(fk_to)) =
                    (edge.from_columns.first(), edge.to_columns.first())
                else {
                    return ungrouped();
                };
                let Some(org_name_col) = org_table.first_column_tagged(ColumnTag::Name) else {
                    return ungrouped();
                };

                let mut sql = format!(
                    "SELECT o.{org_name} AS department, {expr} AS aggregate_value \
                     FROM {entity} e \
                     JOIN {org} o ON e.{fk_from} = o.{fk_to} \
                     GROUP BY o.{org_name}",
                    org_name = quote_ident(&org_name_col.name),
                    expr = agg_expr,
                    entity = quote_ident(entity_table),
                    org = quote_ident(&org_table.name),
                    fk_from = quote_ident(fk_from),
                    fk_to = quote_ident(fk_to),
                );
                if let Some(having) = &intent.having {
                    // The having value comes from digit-only extraction, so
                    // inlining it cannot carry user text.
                    sql.push_str(&format!(
                        " HAVING {} {} {}",
                        agg_expr,
                        having.op.sql_symbol(),
                        having.value
                    ));
                }
                sql.push_str(" ORDER BY aggregate_value DESC");
                SqlStatement::bare(sql)
            }
            Some(Grouping::Location) => {
                let loc_col = schema
                    .table(entity_table)
                    .and_then(|t| t.first_column_tagged(ColumnTag::Location));
                let Some(loc_col) = loc_col else {
                    return ungrouped();
                };
                SqlStatement::bare(format!(
                    "SELECT {loc} AS city, {expr} AS aggregate_value \
                     FROM {entity} \
                     GROUP BY {loc} \
                     ORDER BY aggregate_value DESC",
                    loc = quote_ident(&loc_col.name),
                    expr = agg_expr,
                    entity = quote_ident(entity_table),
                ))
            }
            None => ungrouped(),
        }
    }

    fn build_list(&self, intent: &Intent, entity_table: &str, schema: &Schema) -> SqlStatement {
        let is_primary_entity = schema
            .table(entity_table)
            .map(|t| t.semantic_tag == TableTag::PrimaryEntity)
            .unwrap_or(false);

        if is_primary_entity {
            if let Some(joined) = self.build_entity_list_with_org(intent, entity_table, schema) {
                return joined;
            }
        }

        let mut params = Vec::new();
        let mut sql = format!("SELECT * FROM {}", quote_ident(entity_table));
        if !intent.filters.is_empty() {
            let clause = build_where(&intent.filters, None, &mut params);
            sql.push_str(&format!(" WHERE {}", clause));
        }
        if let Some(ordering) = &intent.ordering {
            sql.push_str(&format!(
                " ORDER BY {} {}",
                quote_ident(&ordering.column),
                ordering.direction.sql_keyword()
            ));
        }
        if let Some(limit) = intent.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        SqlStatement { sql, params }
    }

    /// Listing of a primary-entity table enriched with its organizational
    /// unit name, when the join is resolvable.
    fn build_entity_list_with_org(
        &self,
        intent: &Intent,
        entity_table: &str,
        schema: &Schema,
    ) -> Option<SqlStatement> {
        let org_table = schema.organizational_unit_table()?;
        let edge = schema.relationship_between(entity_table, &org_table.name)?;
        let fk_from = edge.from_columns.first()?;
        let fk_to = edge.to_columns.first()?;
        let org_name_col = org_table.first_column_tagged(ColumnTag::Name)?;

        let mut params = Vec::new();
        let mut sql = format!(
            "SELECT e.*, o.{org_name} AS department \
             FROM {entity} e \
             LEFT JOIN {org} o ON e.{fk_from} = o.{fk_to}",
            org_name = quote_ident(&org_name_col.name),
            entity = quote_ident(entity_table),
            org = quote_ident(&org_table.name),
            fk_from = quote_ident(fk_from),
            fk_to = quote_ident(fk_to),
        );
        if !intent.filters.is_empty() {
            let clause = build_where(&intent.filters, Some("e"), &mut params);
            sql.push_str(&format!(" WHERE {}", clause));
        }
        if let Some(ordering) = &intent.ordering {
            sql.push_str(&format!(
                " ORDER BY e.{} {}",
                quote_ident(&ordering.column),
                ordering.direction.sql_keyword()
            ));
        }
        if let Some(limit) = intent.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        Some(SqlStatement { sql, params })
    }
}

impl Default for SqlSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

fn aggregate_expression(aggregation: &Aggregation) -> String {
    let inner = format!(
        "{}({})",
        aggregation.function.sql_name(),
        quote_ident(&aggregation.column)
    );
    if aggregation.function == AggregateFunction::Avg {
        format!("ROUND(CAST({} AS NUMERIC), 2)", inner)
    } else {
        inner
    }
}

/// Compile filters into an AND-joined clause, pushing bound values into
/// `params` so placeholders stay positional. Year-equality filters compile to
/// date extraction against the current date instead of a parameter.
fn build_where(filters: &[Filter], alias: Option<&str>, params: &mut Vec<BindValue>) -> String {
    let prefix = alias.map(|a| format!("{}.", a)).unwrap_or_default();
    let conditions: Vec<String> = filters
        .iter()
        .map(|filter| {
            let column = format!("{}{}", prefix, quote_ident(&filter.column));
            match &filter.predicate {
                FilterPredicate::Compare { op, value } => {
                    params.push(BindValue::Int(*value));
                    format!("{} {} ${}", column, op.sql_symbol(), params.len())
                }
                FilterPredicate::YearEquals(YearReference::Current) => format!(
                    "EXTRACT(YEAR FROM {}) = EXTRACT(YEAR FROM CURRENT_DATE)",
                    column
                ),
                FilterPredicate::YearEquals(YearReference::Previous) => format!(
                    "EXTRACT(YEAR FROM {}) = EXTRACT(YEAR FROM CURRENT_DATE) - 1",
                    column
                ),
            }
        })
        .collect();
    conditions.join(" AND ")
}
