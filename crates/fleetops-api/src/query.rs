// ── Query builder ──
//
// Translates column filters, ordering and limits into the query-string
// dialect of the table interface: `col=op.value`, `order=col.asc`,
// `limit=n`, `select=...`.

use std::fmt;

/// Comparison operator for a column filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Membership in a list. The filter value is comma-separated.
    In,
    /// `IS` comparison for `null`, `true`, `false`.
    Is,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Neq => "neq",
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::In => "in",
            Self::Is => "is",
        }
    }
}

/// A single `column=op.value` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl fmt::Display) -> Self {
        Self::new(column, FilterOp::Eq, value.to_string())
    }

    /// Build an `in.(a,b,c)` filter.
    pub fn in_list<I, S>(column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        let joined = values
            .into_iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        Self::new(column, FilterOp::In, joined)
    }

    /// Render as a `(column, "op.value")` query pair.
    pub fn to_param(&self) -> (String, String) {
        let value = match self.op {
            FilterOp::In => format!("in.({})", self.value),
            op => format!("{}.{}", op.as_str(), self.value),
        };
        (self.column.clone(), value)
    }
}

/// Sort key for a select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = if self.ascending { "asc" } else { "desc" };
        write!(f, "{}.{dir}", self.column)
    }
}

/// `select=` pair for a projection. The backend rejects whitespace
/// inside the select list.
pub(crate) fn select_param(select: &str) -> (String, String) {
    let compact: String = select.chars().filter(|c| !c.is_whitespace()).collect();
    ("select".to_owned(), compact)
}

/// Select request: projection, filters, ordering, limit.
///
/// Ordering is applied by the backend; no client-side sort happens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub select: Option<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column projection, including embedded joins
    /// (e.g. `"*, aircraft(tail_number)"`).
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = Some(columns.into());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl fmt::Display) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order.push(order);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Query-string pairs in a stable order: select, filters, order, limit.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 3);
        if let Some(ref select) = self.select {
            params.push(select_param(select));
        }
        params.extend(self.filters.iter().map(Filter::to_param));
        if !self.order.is_empty() {
            let order = self
                .order
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(",");
            params.push(("order".to_owned(), order));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_owned(), limit.to_string()));
        }
        params
    }
}
