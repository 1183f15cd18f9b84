use serde::{Deserialize, Serialize};

/// Top-level operation requested by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Count,
    Aggregate,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunction {
    Avg,
    Sum,
    Max,
    Min,
}

impl AggregateFunction {
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Min => "MIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub function: AggregateFunction,
    pub column: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    GreaterThan,
    LessThan,
    Equals,
}

impl CompareOp {
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            CompareOp::GreaterThan => ">",
            CompareOp::LessThan => "<",
            CompareOp::Equals => "=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearReference {
    Current,
    Previous,
}

/// A single detected filter condition on the target table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub predicate: FilterPredicate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterPredicate {
    /// Bound-parameter comparison against a number extracted from the query.
    Compare { op: CompareOp, value: i64 },
    /// Calendar-year equality against the current date; the only
    /// time-dependent filter form.
    YearEquals(YearReference),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grouping {
    Org,
    Location,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Having {
    pub op: CompareOp,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql_keyword(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ordering {
    pub column: String,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowKind {
    RowNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartitionKey {
    OrgUnit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowFunction {
    pub kind: WindowKind,
    pub partition_by: PartitionKey,
    pub limit: i64,
}

/// Structured representation of one natural-language query. Fields are
/// detected independently; the synthesizer resolves their combination by a
/// fixed precedence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub operation: Operation,
    pub target_tables: Vec<String>,
    pub aggregation: Option<Aggregation>,
    pub filters: Vec<Filter>,
    pub grouping: Option<Grouping>,
    pub having: Option<Having>,
    pub ordering: Option<Ordering>,
    pub limit: Option<i64>,
    pub window_function: Option<WindowFunction>,
    pub person_name: Option<String>,
    pub reports_to: Option<String>,
}

impl Intent {
    /// The degradation target for unrecognized input: a plain listing of the
    /// given table with every other field empty.
    pub fn default_list(target_tables: Vec<String>) -> Self {
        Self {
            operation: Operation::List,
            target_tables,
            aggregation: None,
            filters: Vec::new(),
            grouping: None,
            having: None,
            ordering: None,
            limit: None,
            window_function: None,
            person_name: None,
            reports_to: None,
        }
    }
}
