use regex::Regex;

use crate::domain::entities::Schema;
use crate::domain::entities::intent::{
    AggregateFunction, Aggregation, CompareOp, Filter, FilterPredicate, Grouping, Having, Intent,
    Operation, Ordering, PartitionKey, SortDirection, WindowFunction, WindowKind, YearReference,
};
use crate::domain::entities::schema::ColumnTag;

const COUNT_PHRASES: &[&str] = &["how many", "count", "number of"];
const AGGREGATE_PHRASES: &[&str] = &["average", "avg", "sum", "max", "min"];
const FUNCTION_MAP: &[(&str, AggregateFunction)] = &[
    ("average", AggregateFunction::Avg),
    ("avg", AggregateFunction::Avg),
    ("sum", AggregateFunction::Sum),
    ("max", AggregateFunction::Max),
    ("min", AggregateFunction::Min),
];
const ORG_GROUP_PHRASES: &[&str] = &[
    "department",
    "dept",
    "division",
    "by department",
    "per department",
    "each department",
    "in each department",
];
const LOCATION_GROUP_PHRASES: &[&str] = &["city", "location", "by city", "by location"];
const THRESHOLD_PHRASES: &[&str] = &["over", "above", "exceeds", "greater", "more than"];
const HAVING_PHRASES: &[&str] = &["where average", "where avg", "having"];
const SUPERLATIVE_PHRASES: &[&str] = &["top", "highest", "largest"];
const PER_GROUP_PHRASES: &[&str] = &[
    "in each",
    "per department",
    "for each department",
    "each department",
];
const MANAGERIAL_PHRASES: &[&str] = &["reports to", "reporting to", "managed by"];
const INTERROGATIVES: &[&str] = &["Who", "What", "Where", "When", "How", "Why", "Which"];

const DEFAULT_WINDOW_LIMIT: i64 = 5;

/// Converts raw query text plus a schema snapshot into a structured Intent.
/// Total by design: any input degrades to a plain LIST of the primary entity
/// table rather than failing.
pub struct IntentExtractor {
    person_name: Regex,
    number: Regex,
    limit_patterns: Vec<Regex>,
}

impl IntentExtractor {
    pub fn new() -> Self {
        Self {
            person_name: Regex::new(r"\b([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)\b")
                .expect("person name pattern"),
            number: Regex::new(r"(?i)(\d+)k?").expect("number pattern"),
            limit_patterns: vec![
                Regex::new(r"top\s+(\d+)").expect("top-n pattern"),
                Regex::new(r"(\d+)\s+(highest|lowest|top)").expect("n-superlative pattern"),
            ],
        }
    }

    pub fn extract(&self, text: &str, schema: &Schema) -> Intent {
        let lowered = text.to_lowercase().trim().to_string();

        let target_tables = identify_target_tables(schema);
        let mut intent = Intent::default_list(target_tables);

        intent.operation = detect_operation(&lowered);
        intent.person_name = self.extract_person_name(text);
        intent.reports_to = detect_reports_to(&lowered, intent.person_name.as_deref());
        intent.aggregation = detect_aggregation(&lowered, schema, &intent.target_tables);
        intent.grouping = detect_grouping(&lowered, intent.aggregation.as_ref());
        intent.filters = self.detect_filters(&lowered, schema, &intent.target_tables);
        intent.having = self.detect_having(&lowered);
        intent.ordering = detect_ordering(&lowered, schema, &intent.target_tables);
        intent.limit = self.detect_limit(&lowered);
        intent.window_function = detect_window_function(&lowered, intent.limit);

        intent
    }

    /// First capitalized token sequence in the original-case text, skipping
    /// interrogatives.
    fn extract_person_name(&self, text: &str) -> Option<String> {
        self.person_name
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .find(|candidate| !INTERROGATIVES.contains(&candidate.as_str()))
    }

    /// First digit run, with a trailing `k` meaning thousands.
    fn extract_number(&self, text: &str) -> Option<i64> {
        let caps = self.number.captures(text)?;
        let digits: i64 = caps.get(1)?.as_str().parse().ok()?;
        if caps[0].to_lowercase().ends_with('k') {
            Some(digits * 1000)
        } else {
            Some(digits)
        }
    }

    fn detect_filters(&self, query: &str, schema: &Schema, target_tables: &[String]) -> Vec<Filter> {
        let mut filters = Vec::new();
        let Some(table) = target_tables.first().and_then(|name| schema.table(name)) else {
            return filters;
        };

        if THRESHOLD_PHRASES.iter().any(|kw| query.contains(kw)) {
            if let Some(value) = self.extract_number(query) {
                if let Some(col) = table.first_column_tagged(ColumnTag::NumericMeasure) {
                    filters.push(Filter {
                        column: col.name.clone(),
                        predicate: FilterPredicate::Compare {
                            op: CompareOp::GreaterThan,
                            value,
                        },
                    });
                }
            }
        }

        if query.contains("this year") {
            if let Some(col) = table.first_column_tagged(ColumnTag::Date) {
                filters.push(Filter {
                    column: col.name.clone(),
                    predicate: FilterPredicate::YearEquals(YearReference::Current),
                });
            }
        }
        if query.contains("last year") {
            if let Some(col) = table.first_column_tagged(ColumnTag::Date) {
                filters.push(Filter {
                    column: col.name.clone(),
                    predicate: FilterPredicate::YearEquals(YearReference::Previous),
                });
            }
        }

        filters
    }

    fn detect_having(&self, query: &str) -> Option<Having> {
        if !HAVING_PHRASES.iter().any(|kw| query.contains(kw)) {
            return None;
        }
        if !["exceeds", "over", "above"]
            .iter()
            .any(|kw| query.contains(kw))
        {
            return None;
        }
        self.extract_number(query).map(|value| Having {
            op: CompareOp::GreaterThan,
            value,
        })
    }

    fn detect_limit(&self, query: &str) -> Option<i64> {
        self.limit_patterns
            .iter()
            .find_map(|pattern| pattern.captures(query))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}

impl Default for IntentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn detect_operation(query: &str) -> Operation {
    if COUNT_PHRASES.iter().any(|kw| query.contains(kw)) {
        return Operation::Count;
    }
    if AGGREGATE_PHRASES.iter().any(|kw| query.contains(kw)) {
        return Operation::Aggregate;
    }
    Operation::List
}

fn identify_target_tables(schema: &Schema) -> Vec<String> {
    if let Some(table) = schema.primary_entity_table() {
        return vec![table.name.clone()];
    }
    schema
        .tables
        .first()
        .map(|t| vec![t.name.clone()])
        .unwrap_or_default()
}

fn detect_reports_to(query: &str, person_name: Option<&str>) -> Option<String> {
    if MANAGERIAL_PHRASES.iter().any(|kw| query.contains(kw)) {
        return person_name.map(String::from);
    }
    None
}

fn detect_aggregation(
    query: &str,
    schema: &Schema,
    target_tables: &[String],
) -> Option<Aggregation> {
    let function = FUNCTION_MAP
        .iter()
        .find(|(kw, _)| query.contains(kw))
        .map(|(_, func)| *func)?;
    let table = target_tables.first().and_then(|name| schema.table(name))?;
    let column = table.first_column_tagged(ColumnTag::NumericMeasure)?;
    Some(Aggregation {
        function,
        column: column.name.clone(),
    })
}

// Grouping is only meaningful on top of an aggregation.
fn detect_grouping(query: &str, aggregation: Option<&Aggregation>) -> Option<Grouping> {
    aggregation?;
    if ORG_GROUP_PHRASES.iter().any(|kw| query.contains(kw)) {
        return Some(Grouping::Org);
    }
    if LOCATION_GROUP_PHRASES.iter().any(|kw| query.contains(kw)) {
        return Some(Grouping::Location);
    }
    None
}

fn detect_ordering(query: &str, schema: &Schema, target_tables: &[String]) -> Option<Ordering> {
    let table = target_tables.first().and_then(|name| schema.table(name))?;
    if !SUPERLATIVE_PHRASES.iter().any(|kw| query.contains(kw)) {
        return None;
    }
    let column = table.first_column_tagged(ColumnTag::NumericMeasure)?;
    Some(Ordering {
        column: column.name.clone(),
        direction: SortDirection::Desc,
    })
}

fn detect_window_function(query: &str, limit: Option<i64>) -> Option<WindowFunction> {
    if !PER_GROUP_PHRASES.iter().any(|kw| query.contains(kw)) {
        return None;
    }
    if !["top", "highest"].iter().any(|kw| query.contains(kw)) {
        return None;
    }
    Some(WindowFunction {
        kind: WindowKind::RowNumber,
        partition_by: PartitionKey::OrgUnit,
        limit: limit.unwrap_or(DEFAULT_WINDOW_LIMIT),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::domain::entities::schema::{Column, Relationship, Table, TableTag};

    fn column(name: &str, declared_type: &str, tag: ColumnTag) -> Column {
        Column {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            semantic_tag: tag,
        }
    }

    fn mock_schema() -> Schema {
        Schema {
            tables: vec![
                Table {
                    name: "employees".to_string(),
                    columns: vec![
                        column("emp_id", "INTEGER", ColumnTag::Identifier),
                        column("full_name", "VARCHAR", ColumnTag::Name),
                        column("dept_id", "INTEGER", ColumnTag::Identifier),
                        column("annual_salary", "NUMERIC", ColumnTag::NumericMeasure),
                        column("join_date", "DATE", ColumnTag::Date),
                        column("office_location", "VARCHAR", ColumnTag::Location),
                    ],
                    primary_key: vec!["emp_id".to_string()],
                    indexes: vec![],
                    semantic_tag: TableTag::PrimaryEntity,
                },
                Table {
                    name: "departments".to_string(),
                    columns: vec![
                        column("dept_id", "INTEGER", ColumnTag::Identifier),
                        column("dept_name", "VARCHAR", ColumnTag::Name),
                        column("manager_id", "INTEGER", ColumnTag::Identifier),
                    ],
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

    #[test]
    fn detects_count() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("How many employees do we have?", &mock_schema());
        assert_eq!(intent.operation, Operation::Count);
        assert_eq!(intent.target_tables, vec!["employees".to_string()]);
    }

    #[test]
    fn detects_grouped_average_by_department() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("Average salary by department", &mock_schema());
        assert_eq!(intent.operation, Operation::Aggregate);
        assert_eq!(intent.grouping, Some(Grouping::Org));
        let agg = intent.aggregation.unwrap();
        assert_eq!(agg.function, AggregateFunction::Avg);
        assert_eq!(agg.column, "annual_salary");
    }

    #[test]
    fn detects_salary_filter() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("Employees with salary over 120000", &mock_schema());
        assert_eq!(intent.operation, Operation::List);
        assert_eq!(intent.filters.len(), 1);
        assert_eq!(intent.filters[0].column, "annual_salary");
        assert_eq!(
            intent.filters[0].predicate,
            FilterPredicate::Compare {
                op: CompareOp::GreaterThan,
                value: 120000
            }
        );
    }

    #[test]
    fn k_suffix_multiplies_by_thousand() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("Employees earning more than 120k", &mock_schema());
        assert_eq!(
            intent.filters[0].predicate,
            FilterPredicate::Compare {
                op: CompareOp::GreaterThan,
                value: 120000
            }
        );
    }

    #[test]
    fn numeric_and_date_filters_co_occur() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract(
            "Employees hired this year with salary over 50000",
            &mock_schema(),
        );
        assert_eq!(intent.filters.len(), 2);
        assert_eq!(
            intent.filters[1].predicate,
            FilterPredicate::YearEquals(YearReference::Current)
        );
        assert_eq!(intent.filters[1].column, "join_date");
    }

    #[test]
    fn last_year_maps_to_previous_year_filter() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("Employees who joined last year", &mock_schema());
        assert_eq!(
            intent.filters[0].predicate,
            FilterPredicate::YearEquals(YearReference::Previous)
        );
    }

    #[test]
    fn detects_window_for_top_n_per_department() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract(
            "Top 5 highest paid employees in each department",
            &mock_schema(),
        );
        let window = intent.window_function.unwrap();
        assert_eq!(window.kind, WindowKind::RowNumber);
        assert_eq!(window.limit, 5);
        assert_eq!(intent.limit, Some(5));
    }

    #[test]
    fn window_limit_defaults_to_five() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("Highest paid employees in each department", &mock_schema());
        assert_eq!(intent.window_function.unwrap().limit, 5);
        assert_eq!(intent.limit, None);
    }

    #[test]
    fn detects_reports_to() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("Who reports to Anjali Gupta?", &mock_schema());
        assert_eq!(intent.reports_to.as_deref(), Some("Anjali Gupta"));
        assert_eq!(intent.person_name.as_deref(), Some("Anjali Gupta"));
    }

    #[test]
    fn person_name_without_managerial_phrase_is_not_reports_to() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("show me Anjali Gupta", &mock_schema());
        assert_eq!(intent.person_name.as_deref(), Some("Anjali Gupta"));
        assert!(intent.reports_to.is_none());
    }

    #[test]
    fn interrogatives_are_not_person_names() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("Who is the manager?", &mock_schema());
        assert!(intent.person_name.is_none());
    }

    #[test]
    fn detects_having_clause() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract(
            "Departments where average salary exceeds 90000",
            &mock_schema(),
        );
        assert_eq!(
            intent.having,
            Some(Having {
                op: CompareOp::GreaterThan,
                value: 90000
            })
        );
    }

    #[test]
    fn detects_descending_order_on_superlative() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("Top earners", &mock_schema());
        let ordering = intent.ordering.unwrap();
        assert_eq!(ordering.column, "annual_salary");
        assert_eq!(ordering.direction, SortDirection::Desc);
    }

    #[test]
    fn grouping_requires_aggregation() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("Employees by department", &mock_schema());
        assert!(intent.aggregation.is_none());
        assert!(intent.grouping.is_none());
    }

    #[test]
    fn unrecognized_input_degrades_to_list() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("xylophone quandary ????", &mock_schema());
        assert_eq!(intent.operation, Operation::List);
        assert_eq!(intent.target_tables, vec!["employees".to_string()]);
        assert!(intent.filters.is_empty());
        assert!(intent.aggregation.is_none());
        assert!(intent.window_function.is_none());
    }

    #[test]
    fn extraction_is_total_on_empty_schema() {
        let extractor = IntentExtractor::new();
        let empty = Schema {
            tables: vec![],
            relationships: vec![],
            samples: BTreeMap::new(),
            vocabulary: vec![],
        };
        let intent = extractor.extract("how many things", &empty);
        assert_eq!(intent.operation, Operation::Count);
        assert!(intent.target_tables.is_empty());
    }

    #[test]
    fn falls_back_to_first_table_without_primary_entity() {
        let mut schema = mock_schema();
        schema.tables[0].semantic_tag = TableTag::Auxiliary;
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("list everything", &schema);
        assert_eq!(intent.target_tables, vec!["employees".to_string()]);
    }

    #[test]
    fn limit_from_n_highest_pattern() {
        let extractor = IntentExtractor::new();
        let intent = extractor.extract("3 highest salaries", &mock_schema());
        assert_eq!(intent.limit, Some(3));
    }
}
