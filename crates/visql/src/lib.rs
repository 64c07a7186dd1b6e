//! # visql
//!
//! The core of a form-driven SQL `SELECT` builder.
//!
//! ## Features
//!
//! - **Schema catalog**: a fixed set of tables, their columns, and which tables may be joined
//! - **Plain state value**: every user selection lives in one [`BuilderState`]
//! - **Named actions**: each interaction is a handler returning a new state; rejected input leaves
//!   the old state untouched
//! - **Picker options**: eligible tables, join endpoints and qualified columns for the form
//! - **Validate & render**: named validation failures, or the assembled SQL text
//!
//! No SQL is executed and values are inserted verbatim; the output is text for display.
//!
//! ## Example
//!
//! ```
//! use visql::{BuilderState, Operator, QueryAssembler, SchemaCatalog};
//!
//! let catalog = SchemaCatalog::demo();
//! let qa = QueryAssembler::new(&catalog);
//!
//! let state = BuilderState::new()
//!     .select_table(&catalog, 0, Some("Products"))?
//!     .select_columns(&catalog, 0, &["ProductName", "Price"])?
//!     .set_where_column(&catalog, 0, Some("Products.Price"))?
//!     .set_where_operator(0, Operator::Gt)?
//!     .set_where_value(0, "100")?
//!     .set_limit(Some(10))?;
//!
//! assert_eq!(
//!     qa.generate(&state)?.as_deref(),
//!     Some("SELECT Products.ProductName, Products.Price FROM Products WHERE Products.Price > 100 LIMIT 10")
//! );
//! # Ok::<(), visql::BuildError>(())
//! ```

pub mod actions;
pub mod assembler;
pub mod catalog;
pub mod error;
pub mod state;

pub use actions::split_qualified;
pub use assembler::QueryAssembler;
pub use catalog::{CatalogBuilder, SchemaCatalog, Table};
pub use error::{BuildError, BuildResult, RowKind};
pub use state::{
    BuilderState, Direction, JoinEntry, JoinSide, JoinType, Operator, OrderBy, TableSelection,
    WhereCondition,
};
