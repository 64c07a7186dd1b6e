//! Builder state: every selection the user has made so far.
//!
//! A [`BuilderState`] is a plain value. It is changed only through the action
//! handlers in [`crate::actions`], each of which returns a new state and leaves
//! the old one untouched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Join kind rendered before `JOIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
    Full,
}

impl JoinType {
    pub const ALL: [JoinType; 4] = [Self::Inner, Self::Left, Self::Right, Self::Full];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
        }
    }
}

/// Comparison operator of a where-condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Operator {
    #[default]
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "IS NULL")]
    IsNull,
    #[serde(rename = "IS NOT NULL")]
    IsNotNull,
}

impl Operator {
    pub const ALL: [Operator; 8] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Lt,
        Self::Gte,
        Self::Lte,
        Self::IsNull,
        Self::IsNotNull,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }

    /// `IS NULL` / `IS NOT NULL`: these take no value.
    pub fn is_null_check(&self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

/// Sort direction for ORDER BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Self::Asc, Self::Desc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

macro_rules! keyword_enum_text {
    ($ty:ident, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .ok_or_else(|| format!("unknown {}: {s}", $what))
            }
        }
    };
}

keyword_enum_text!(JoinType, "join type");
keyword_enum_text!(Operator, "operator");
keyword_enum_text!(Direction, "direction");

/// One table row of the form: a table and the columns picked from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSelection {
    /// `None` until a table is picked.
    pub table: Option<String>,
    pub columns: Vec<String>,
}

impl TableSelection {
    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn is_set(&self) -> bool {
        self.table.is_some()
    }
}

/// Side of a join row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    /// `table1.column1`
    Left,
    /// `table2.column2`
    Right,
}

/// One join row: `<type> JOIN table2 ON table1.column1 = table2.column2`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinEntry {
    pub table1: Option<String>,
    pub column1: Option<String>,
    pub table2: Option<String>,
    pub column2: Option<String>,
    pub join_type: Option<JoinType>,
}

impl Default for JoinEntry {
    fn default() -> Self {
        Self {
            table1: None,
            column1: None,
            table2: None,
            column2: None,
            join_type: Some(JoinType::Inner),
        }
    }
}

impl JoinEntry {
    /// Table and column set on both sides.
    pub fn has_endpoints(&self) -> bool {
        self.table1.is_some()
            && self.column1.is_some()
            && self.table2.is_some()
            && self.column2.is_some()
    }

    /// Both endpoints and a join type set; only such joins are rendered.
    pub fn is_complete(&self) -> bool {
        self.has_endpoints() && self.join_type.is_some()
    }

    /// `table.column` for one side, if both parts are set.
    pub fn endpoint(&self, side: JoinSide) -> Option<String> {
        let (table, column) = match side {
            JoinSide::Left => (&self.table1, &self.column1),
            JoinSide::Right => (&self.table2, &self.column2),
        };
        match (table, column) {
            (Some(t), Some(c)) => Some(format!("{t}.{c}")),
            _ => None,
        }
    }
}

/// One where row: `column1 operator column2`.
///
/// `column1` is a qualified `table.column`; `column2` is a literal value that
/// is inserted into the SQL verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhereCondition {
    pub column1: Option<String>,
    pub operator: Operator,
    pub column2: String,
}

impl WhereCondition {
    pub fn is_active(&self) -> bool {
        self.column1.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Active, compares against a value, and the value is empty.
    pub fn is_missing_value(&self) -> bool {
        self.is_active() && !self.operator.is_null_check() && self.column2.is_empty()
    }
}

/// ORDER BY column and direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBy {
    pub column: Option<String>,
    pub direction: Direction,
}

/// Everything selected in the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderState {
    pub tables: Vec<TableSelection>,
    pub joins: Vec<JoinEntry>,
    pub conditions: Vec<WhereCondition>,
    pub group_by: Option<String>,
    pub order_by: OrderBy,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Default for BuilderState {
    fn default() -> Self {
        Self::new()
    }
}

impl BuilderState {
    /// Fresh state: one empty table row, one empty join row, one empty
    /// where row.
    pub fn new() -> Self {
        Self {
            tables: vec![TableSelection::default()],
            joins: vec![JoinEntry::default()],
            conditions: vec![WhereCondition::default()],
            group_by: None,
            order_by: OrderBy::default(),
            limit: None,
            offset: None,
        }
    }

    /// Table names picked so far, in row order; unset rows are skipped.
    pub fn selected_tables(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().filter_map(TableSelection::table_name)
    }

    /// Number of rows with a table picked.
    pub fn selected_count(&self) -> usize {
        self.selected_tables().count()
    }

    pub fn is_selected(&self, table: &str) -> bool {
        self.selected_tables().any(|t| t == table)
    }

    /// Table of the first row, if picked.
    pub fn first_table(&self) -> Option<&str> {
        self.tables.first().and_then(TableSelection::table_name)
    }
}
