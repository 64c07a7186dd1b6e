//! Error types for visql

use thiserror::Error;

/// Result type alias for visql operations
pub type BuildResult<T> = Result<T, BuildError>;

/// Which list of form rows an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Table,
    Join,
    Where,
}

impl std::fmt::Display for RowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Join => "join",
            Self::Where => "where",
        })
    }
}

/// Error types for building a query.
///
/// The first four variants are the validation failures reported by
/// [`QueryAssembler::generate`](crate::QueryAssembler::generate); their display
/// text is the notification shown to the user. The rest are raised when an
/// action handler or the catalog rejects its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The first table row has no table.
    #[error("Select at least one table!")]
    NoTableSelected,

    /// A second table row exists but has no table.
    #[error("Select Second table!")]
    SecondTableMissing,

    /// Several tables are selected but no join has both endpoints.
    #[error("Joins are required when selecting multiple tables!")]
    JoinsRequired,

    /// A where-condition with a comparison operator has no value.
    #[error("Enter Value Of Where Condition!")]
    MissingWhereValue,

    /// Table name not present in the catalog
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Column not present in the row's table
    #[error("Unknown column '{column}' for table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// Row index past the end of the given list
    #[error("No {kind} row at index {index}")]
    RowOutOfRange { kind: RowKind, index: usize },

    /// Join endpoint that is not of the form `table.column`
    #[error("Expected a qualified column (table.column), got '{0}'")]
    InvalidQualifiedColumn(String),

    /// Limit must be positive
    #[error("Limit must be greater than zero, got {0}")]
    InvalidLimit(u64),

    /// Offset requires a limit and must not exceed it
    #[error("Offset {offset} must be between 0 and the limit ({})", fmt_limit(.limit))]
    InvalidOffset { offset: u64, limit: Option<u64> },

    /// Table exists but is not among the options for the row
    #[error("Table {table} cannot be picked on table row {row}")]
    TableNotEligible { table: String, row: usize },

    /// Adding another table row would pass the row cap
    #[error("No more table rows can be added (limit {0})")]
    TableRowLimit(usize),

    /// Qualified column that does not belong to a selected table
    #[error("Column {0} does not belong to a selected table")]
    ColumnNotSelected(String),

    /// Join endpoint that is not a shared column of two related selected tables
    #[error("{0} is not a join column between the selected tables")]
    InvalidJoinEndpoint(String),

    /// Two catalog tables share a name
    #[error("Duplicate table in catalog: {0}")]
    DuplicateTable(String),

    /// Relationship names a table the catalog does not define
    #[error("Relationship {from} -> {to} references an unknown table")]
    UnknownRelationship { from: String, to: String },
}

fn fmt_limit(limit: &Option<u64>) -> String {
    match limit {
        Some(n) => n.to_string(),
        None => "unset".to_string(),
    }
}

impl BuildError {
    /// Create an unknown column error
    pub fn unknown_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::UnknownColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Create a row out of range error
    pub fn row_out_of_range(kind: RowKind, index: usize) -> Self {
        Self::RowOutOfRange { kind, index }
    }

    /// Check if this is one of the named validation failures from `generate`.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::NoTableSelected
                | Self::SecondTableMissing
                | Self::JoinsRequired
                | Self::MissingWhereValue
        )
    }

    /// Check if this error rejected the input of an action handler.
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Self::UnknownTable(_)
                | Self::UnknownColumn { .. }
                | Self::RowOutOfRange { .. }
                | Self::InvalidQualifiedColumn(_)
                | Self::InvalidLimit(_)
                | Self::InvalidOffset { .. }
                | Self::TableNotEligible { .. }
                | Self::TableRowLimit(_)
                | Self::ColumnNotSelected(_)
                | Self::InvalidJoinEndpoint(_)
        )
    }

    /// Stable name of the failure, e.g. `"JoinsRequired"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoTableSelected => "NoTableSelected",
            Self::SecondTableMissing => "SecondTableMissing",
            Self::JoinsRequired => "JoinsRequired",
            Self::MissingWhereValue => "MissingWhereValue",
            Self::UnknownTable(_) => "UnknownTable",
            Self::UnknownColumn { .. } => "UnknownColumn",
            Self::RowOutOfRange { .. } => "RowOutOfRange",
            Self::InvalidQualifiedColumn(_) => "InvalidQualifiedColumn",
            Self::InvalidLimit(_) => "InvalidLimit",
            Self::InvalidOffset { .. } => "InvalidOffset",
            Self::TableNotEligible { .. } => "TableNotEligible",
            Self::TableRowLimit(_) => "TableRowLimit",
            Self::ColumnNotSelected(_) => "ColumnNotSelected",
            Self::InvalidJoinEndpoint(_) => "InvalidJoinEndpoint",
            Self::DuplicateTable(_) => "DuplicateTable",
            Self::UnknownRelationship { .. } => "UnknownRelationship",
        }
    }
}
