// ── Entity descriptors ──
//
// Static description of each table the dashboard manages: editable
// fields with their kinds, required marks and defaults, the select
// projection (embedded joins included), default ordering, and list
// columns. Forms, controllers and dialogs are generic over these.

mod fleet;

use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

use fleetops_api::{Order, Query};

use crate::error::ValidationError;
use crate::model::{EntityId, Fields};

pub use fleet::next_due;

// ── EntityKind ───────────────────────────────────────────────────────

/// Every record type the dashboard manages.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum EntityKind {
    Aircraft,
    WorkOrders,
    Maintenance,
    Inventory,
    Compliance,
    Alerts,
    Telemetry,
}

impl EntityKind {
    pub fn descriptor(self) -> &'static EntityDescriptor {
        match self {
            Self::Aircraft => &fleet::AIRCRAFT,
            Self::WorkOrders => &fleet::WORK_ORDERS,
            Self::Maintenance => &fleet::MAINTENANCE,
            Self::Inventory => &fleet::INVENTORY,
            Self::Compliance => &fleet::COMPLIANCE,
            Self::Alerts => &fleet::ALERTS,
            Self::Telemetry => &fleet::TELEMETRY,
        }
    }
}

// ── Fields ───────────────────────────────────────────────────────────

/// How a draft string is coerced before submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Decimal,
    /// `YYYY-MM-DD`.
    Date,
    /// RFC 3339, or a bare date taken as midnight UTC.
    Timestamp,
    Boolean,
    /// One of a closed set of strings.
    Choice(&'static [&'static str]),
    /// Id of a row in another table.
    Reference(ReferenceTarget),
}

/// The table a reference column points into, and the column that names
/// one of its rows to a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceTarget {
    pub table: &'static str,
    pub display: &'static str,
}

impl ReferenceTarget {
    pub const fn new(table: &'static str, display: &'static str) -> Self {
        Self { table, display }
    }
}

/// One row a reference field may point at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: EntityId,
    pub label: String,
}

impl Choice {
    /// Matches an id, or a label ignoring case.
    pub fn matches(&self, raw: &str) -> bool {
        self.id.to_string() == raw || self.label.eq_ignore_ascii_case(raw)
    }
}

impl FieldKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Integer | Self::Decimal)
    }
}

/// Value a fresh Add draft starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    Empty,
    Text(&'static str),
    Integer(i64),
    /// The current date at draft creation.
    Today,
}

/// One editable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub non_negative: bool,
    pub default: FieldDefault,
}

impl FieldSpec {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            non_negative: false,
            default: FieldDefault::Empty,
        }
    }

    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub const fn integer(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Integer)
    }

    pub const fn decimal(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Decimal)
    }

    pub const fn date(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Date)
    }

    pub const fn timestamp(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Timestamp)
    }

    pub const fn boolean(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Boolean)
    }

    pub const fn choice(
        name: &'static str,
        label: &'static str,
        options: &'static [&'static str],
    ) -> Self {
        Self::new(name, label, FieldKind::Choice(options))
    }

    pub const fn reference(
        name: &'static str,
        label: &'static str,
        target: ReferenceTarget,
    ) -> Self {
        Self::new(name, label, FieldKind::Reference(target))
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn non_negative(mut self) -> Self {
        self.non_negative = true;
        self
    }

    pub const fn default_text(mut self, value: &'static str) -> Self {
        self.default = FieldDefault::Text(value);
        self
    }

    pub const fn default_int(mut self, value: i64) -> Self {
        self.default = FieldDefault::Integer(value);
        self
    }

    pub const fn default_today(mut self) -> Self {
        self.default = FieldDefault::Today;
        self
    }
}

// ── Descriptor ───────────────────────────────────────────────────────

/// Server-side sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: &'static str,
    pub ascending: bool,
}

impl SortKey {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            ascending: true,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            ascending: false,
        }
    }
}

/// A list column: a field name or `relation.field` path, and its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub path: &'static str,
    pub header: &'static str,
}

impl Column {
    pub const fn new(path: &'static str, header: &'static str) -> Self {
        Self { path, header }
    }
}

/// Hook that fills derived columns into a validated submission.
pub type DeriveFn = fn(&mut Fields) -> Result<(), ValidationError>;

/// Everything the generic record machinery needs to know about a table.
#[derive(Debug)]
pub struct EntityDescriptor {
    pub kind: EntityKind,
    pub table: &'static str,
    /// Human name of one record, e.g. "Work order".
    pub singular: &'static str,
    /// Human name of the set, e.g. "Work orders".
    pub plural: &'static str,
    /// Projection including embedded joins.
    pub select: &'static str,
    pub order: &'static [SortKey],
    pub limit: Option<u32>,
    pub fields: &'static [FieldSpec],
    /// Column (or join path) that names a record in messages.
    pub title_field: &'static str,
    pub columns: &'static [Column],
    pub derive: Option<DeriveFn>,
}

impl EntityDescriptor {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The list query: projection, default order and limit.
    pub fn query(&self) -> Query {
        let mut query = Query::new().select(self.select);
        for key in self.order {
            query = query.order(if key.ascending {
                Order::asc(key.column)
            } else {
                Order::desc(key.column)
            });
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        query
    }
}
