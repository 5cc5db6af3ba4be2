//! Filter compilation for record queries.
//!
//! A [`RecordFilter`] is compiled into a [`Predicate`]: an ordered list of
//! `(column, comparison, value)` clauses. Column names and operators come from
//! closed enums, and every value is bound as a positional parameter, so no
//! caller-supplied text ever becomes part of the SQL string.

use ::duckdb::ToSql;

/// Default page number for record queries.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size for record queries.
pub const DEFAULT_LIMIT: u32 = 5;

/// Optional record constraints plus pagination.
///
/// Dates must already be valid `YYYY-MM-DD` strings; the compiler does not
/// validate them. `page` and `limit` are expected to be positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub symbol: Option<String>,
    pub page: u32,
    pub limit: u32,
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            symbol: None,
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl RecordFilter {
    pub fn with_start_date(mut self, date: impl Into<String>) -> Self {
        self.start_date = Some(date.into());
        self
    }

    pub fn with_end_date(mut self, date: impl Into<String>) -> Self {
        self.end_date = Some(date.into());
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Number of rows to skip before the requested page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// Columns a predicate may constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Date,
    Symbol,
}

impl Column {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Symbol => "symbol",
        }
    }
}

/// Comparison operators a predicate may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    GreaterOrEqual,
    LessOrEqual,
    Equal,
}

impl Comparison {
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::GreaterOrEqual => ">=",
            Self::LessOrEqual => "<=",
            Self::Equal => "=",
        }
    }
}

/// One bound condition of a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub column: Column,
    pub comparison: Comparison,
    pub value: String,
}

impl Clause {
    fn new(column: Column, comparison: Comparison, value: impl Into<String>) -> Self {
        Self {
            column,
            comparison,
            value: value.into(),
        }
    }

    fn to_sql(&self) -> String {
        format!("{} {} ?", self.column.as_sql(), self.comparison.as_sql())
    }
}

/// Compiled conjunction of clauses with its positional parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// SQL text for a `WHERE` clause, `1=1` when nothing is constrained.
    pub fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            return String::from("1=1");
        }

        self.clauses
            .iter()
            .map(Clause::to_sql)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    /// Bound values in placeholder order.
    pub fn params(&self) -> Vec<&dyn ToSql> {
        self.clauses
            .iter()
            .map(|clause| &clause.value as &dyn ToSql)
            .collect()
    }
}

/// Compile a filter into a predicate.
///
/// Clause order is fixed: start date, end date, symbol. The symbol is trimmed
/// and uppercased so matching is exact and case-insensitive for callers.
pub fn compile(filter: &RecordFilter) -> Predicate {
    let mut clauses = Vec::with_capacity(3);

    if let Some(start_date) = non_empty(filter.start_date.as_deref()) {
        clauses.push(Clause::new(
            Column::Date,
            Comparison::GreaterOrEqual,
            start_date,
        ));
    }
    if let Some(end_date) = non_empty(filter.end_date.as_deref()) {
        clauses.push(Clause::new(Column::Date, Comparison::LessOrEqual, end_date));
    }
    if let Some(symbol) = non_empty(filter.symbol.as_deref()) {
        clauses.push(Clause::new(
            Column::Symbol,
            Comparison::Equal,
            symbol.to_ascii_uppercase(),
        ));
    }

    Predicate { clauses }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
