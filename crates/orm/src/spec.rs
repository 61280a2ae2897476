//! Declarative query specifications.
//!
//! A [`QuerySpec`] describes what to fetch (filters, sorting, field
//! selection, pagination, a search term and relations) without saying how.
//! Specs deserialize from the JSON surface older callers speak (camelCase
//! keys, `as`/`type` relation attributes) and serialize canonically, which is
//! what makes cache keys stable.
//!
//! [`QueryInput`] resolves the legacy calling convention (a bare filter
//! mapping in place of a structured spec) exactly once, at the boundary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Entity;

/// A filter mapping: field name (optionally `table.column`-qualified) to a
/// filter value.
///
/// Values are interpreted structurally: `null` tests for SQL NULL, an array
/// is a membership test, an object maps operator names
/// (`gt`, `lt`, `gte`, `lte`, `ne`, `like`, `ilike`) to operands, and any
/// other value is an equality test.
pub type FilterMap = serde_json::Map<String, Value>;

/// A structured query specification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuerySpec {
    /// Conditions on the main table (or, `table.column`-qualified, on joined
    /// relations).
    pub filters: FilterMap,
    /// Result ordering.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
    /// Projection for the main table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldSelection>,
    /// Page selection; enables total-count computation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationSpec>,
    /// Search term matched against the model's searchable fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Relations to join and reassemble.
    pub relations: Vec<RelationSpec>,
}

/// Result ordering: one column, several columns, or a column→direction map.
///
/// String forms take an optional leading `-` for descending order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortSpec {
    /// A single column.
    Column(String),
    /// Several columns, applied in order.
    Columns(Vec<String>),
    /// Column to direction (`asc`/`desc`) mapping.
    Directed(serde_json::Map<String, Value>),
}

/// Field projection: everything, one column, or a list of columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSelection {
    /// One column, or `"*"` for everything.
    Column(String),
    /// A list of columns.
    Columns(Vec<String>),
}

impl FieldSelection {
    /// The selected column names, or `None` for a `*` selection.
    #[must_use]
    pub fn columns(&self) -> Option<Vec<&str>> {
        match self {
            Self::Column(col) if col.as_str() == "*" => None,
            Self::Column(col) => Some(vec![col.as_str()]),
            Self::Columns(cols) => {
                let named: Vec<&str> =
                    cols.iter().map(String::as_str).filter(|col| *col != "*").collect();
                if named.is_empty() { None } else { Some(named) }
            }
        }
    }
}

/// Page selection. Out-of-range values are clamped, not rejected.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSpec {
    /// 1-based page number; values below 1 clamp to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    /// Page size; clamped to `[1, max_limit]`, defaulting to the model's
    /// `default_limit` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Join kind and reassembly cardinality of a relation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// `INNER JOIN`.
    Inner,
    /// `LEFT JOIN` (the default).
    #[default]
    Left,
    /// `RIGHT JOIN`.
    Right,
    /// One-to-many: joins like `left`, but reassembles into an array.
    Many,
}

impl RelationKind {
    /// The SQL join keyword for this kind.
    #[must_use]
    pub const fn join_keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left | Self::Many => "LEFT",
            Self::Right => "RIGHT",
        }
    }

    /// Whether reassembly produces an array.
    #[must_use]
    pub const fn is_many(self) -> bool {
        matches!(self, Self::Many)
    }
}

/// A declared foreign-key link from the main table to another table.
///
/// Specs missing `table` or `foreignKey` are silently skipped by the
/// compiler, matching the permissive JSON surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RelationSpec {
    /// The related table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Column on the related table matched against the local key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
    /// Column on the main table the join matches; defaults to the model's
    /// primary key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_key: Option<String>,
    /// Key the nested data appears under on the parent record; defaults to
    /// the table name.
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Join kind / cardinality.
    #[serde(rename = "type")]
    pub kind: RelationKind,
    /// Projection for the related table. Nested data requires an explicit
    /// field list; `"*"` (or absence) joins for filtering only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<FieldSelection>,
    /// Conditions scoped to the related table.
    pub filters: FilterMap,
}

impl RelationSpec {
    /// Creates a complete relation spec for `table` joined on `foreign_key`.
    #[must_use]
    pub fn new(table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            foreign_key: Some(foreign_key.into()),
            ..Self::default()
        }
    }

    /// Sets the local join column.
    #[must_use]
    pub fn local_key(mut self, column: impl Into<String>) -> Self {
        self.local_key = Some(column.into());
        self
    }

    /// Sets the key the nested data appears under.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the join kind / cardinality.
    #[must_use]
    pub const fn kind(mut self, kind: RelationKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the projection for the related table.
    #[must_use]
    pub fn select(mut self, fields: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.select = Some(FieldSelection::Columns(fields.into_iter().map(Into::into).collect()));
        self
    }

    /// Sets conditions scoped to the related table.
    #[must_use]
    pub fn filters(mut self, filters: FilterMap) -> Self {
        self.filters = filters;
        self
    }

    /// The `(table, foreign_key)` pair, when both are present.
    #[must_use]
    pub fn join_parts(&self) -> Option<(&str, &str)> {
        Some((self.table.as_deref()?, self.foreign_key.as_deref()?))
    }

    /// The key the nested data appears under on the parent record.
    #[must_use]
    pub fn attach_key(&self) -> Option<&str> {
        self.alias.as_deref().or(self.table.as_deref())
    }
}

/// A query argument resolved once at the boundary: either a structured spec
/// or a legacy bare filter mapping.
#[derive(Debug, Clone)]
pub enum QueryInput {
    /// A structured [`QuerySpec`].
    Spec(QuerySpec),
    /// A bare filter mapping (older calling convention). Forces total-count
    /// computation.
    Legacy(FilterMap),
}

/// Keys that identify a JSON object as a structured spec.
const SPEC_KEYS: [&str; 6] = ["filters", "sort", "fields", "pagination", "search", "relations"];

impl QueryInput {
    /// Classify a raw JSON argument.
    ///
    /// An object with at least one recognized spec key parses as a
    /// [`QuerySpec`]; any other object is a legacy filter mapping. `null`
    /// means "no constraints" and non-object scalars carry no usable
    /// conditions, so they normalize to an empty structured / legacy input
    /// respectively.
    ///
    /// # Errors
    ///
    /// Returns a deserialization error when a recognized spec object has
    /// malformed contents.
    pub fn from_json(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Null => Ok(Self::Spec(QuerySpec::default())),
            Value::Object(map) => {
                if map.keys().any(|key| SPEC_KEYS.contains(&key.as_str())) {
                    serde_json::from_value(Value::Object(map)).map(Self::Spec)
                } else {
                    Ok(Self::Legacy(map))
                }
            }
            _ => Ok(Self::Legacy(FilterMap::new())),
        }
    }

    /// Resolve into an effective spec plus the force-count flag.
    #[must_use]
    pub fn normalize(self) -> (QuerySpec, bool) {
        match self {
            Self::Spec(spec) => (spec, false),
            Self::Legacy(filters) => (
                QuerySpec {
                    filters,
                    ..QuerySpec::default()
                },
                true,
            ),
        }
    }
}

impl From<QuerySpec> for QueryInput {
    fn from(spec: QuerySpec) -> Self {
        Self::Spec(spec)
    }
}

impl From<FilterMap> for QueryInput {
    fn from(filters: FilterMap) -> Self {
        Self::Legacy(filters)
    }
}

/// Pagination metadata accompanying query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Total matching records.
    pub total: u64,
    /// 1-based page number.
    pub page: u64,
    /// Page size.
    pub limit: u64,
    /// Total pages.
    pub pages: u64,
    /// Whether a further page exists.
    pub has_next: bool,
}

impl PageInfo {
    /// Compute metadata from a total, page number and limit.
    #[must_use]
    pub fn compute(total: u64, page: u64, limit: u64) -> Self {
        let pages = if limit > 0 { total.div_ceil(limit) } else { 1 };
        let offset = page.saturating_sub(1).saturating_mul(limit);
        let has_next = limit > 0 && offset.saturating_add(limit) < total;
        Self {
            total,
            page,
            limit,
            pages,
            has_next,
        }
    }
}

/// A page of entities plus pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// The entities.
    pub data: Vec<Entity>,
    /// Pagination metadata.
    pub pagination: PageInfo,
}
