use std::fmt;

///
/// SortDirection
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse a caller-supplied direction token; anything but an explicit
    /// ascending marker is descending.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("asc") {
            Self::Asc
        } else {
            Self::Desc
        }
    }

    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

///
/// JoinKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum JoinKind {
    Left,
    Inner,
}

impl JoinKind {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Inner => "INNER",
        }
    }
}

///
/// JoinSpec
///
/// Read-only display join declared on the descriptor. The join condition is
/// author-supplied static text, checked against a restricted character set
/// at construction time.
///

#[derive(Clone, Debug)]
pub struct JoinSpec {
    pub kind: JoinKind,
    pub table: String,
    pub alias: String,
    pub on: String,
}

impl JoinSpec {
    #[must_use]
    pub fn new(
        kind: JoinKind,
        table: impl Into<String>,
        alias: impl Into<String>,
        on: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            table: table.into(),
            alias: alias.into(),
            on: on.into(),
        }
    }

    pub(crate) fn to_sql(&self) -> String {
        format!("{} JOIN {} {} ON {}", self.kind.as_sql(), self.table, self.alias, self.on)
    }
}

///
/// QueryConfig
///
/// The entity's allowed query surface: sortable columns (external name →
/// qualified expression), searchable columns, declared status values,
/// display joins, and the list/detail projections. Everything the list
/// operation accepts from a caller is checked against this.
///

#[derive(Clone, Debug)]
pub struct QueryConfig {
    pub default_sort: String,
    pub default_direction: SortDirection,
    pub default_limit: i64,
    pub max_limit: i64,
    pub sortable: Vec<(String, String)>,
    pub search_columns: Vec<String>,
    pub statuses: Vec<String>,
    pub joins: Vec<JoinSpec>,
    pub list_columns: Vec<String>,
    pub detail_columns: Vec<String>,
}

impl QueryConfig {
    /// Resolve a requested sort key against the allow-list; unknown keys
    /// fall back to the default sort rather than failing.
    #[must_use]
    pub fn sort_expression(&self, requested: Option<&str>) -> &str {
        requested
            .and_then(|key| self.lookup_sort(key))
            .or_else(|| self.lookup_sort(&self.default_sort))
            .unwrap_or("1")
    }

    fn lookup_sort(&self, key: &str) -> Option<&str> {
        self.sortable
            .iter()
            .find(|(external, _)| external == key)
            .map(|(_, expr)| expr.as_str())
    }

    #[must_use]
    pub fn is_declared_status(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }

    pub(crate) fn join_clause(&self) -> String {
        self.joins
            .iter()
            .map(JoinSpec::to_sql)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
