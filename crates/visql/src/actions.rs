//! Named action handlers for [`BuilderState`].
//!
//! Each handler maps one user interaction to a new state value. Handlers that
//! can reject their input return [`BuildResult`]; on rejection the caller still
//! holds the unchanged previous state.
//!
//! # Example
//!
//! ```
//! use visql::{BuilderState, JoinSide, SchemaCatalog};
//!
//! let catalog = SchemaCatalog::demo();
//! let state = BuilderState::new()
//!     .select_table(&catalog, 0, Some("Categories"))?
//!     .add_table_row(&catalog)?
//!     .select_table(&catalog, 1, Some("Products"))?
//!     .set_join_endpoint(&catalog, 0, JoinSide::Left, Some("Categories.CategoryID"))?
//!     .set_join_endpoint(&catalog, 0, JoinSide::Right, Some("Products.CategoryID"))?;
//!
//! assert!(state.joins[0].is_complete());
//! # Ok::<(), visql::BuildError>(())
//! ```

use crate::assembler::QueryAssembler;
use crate::catalog::SchemaCatalog;
use crate::error::{BuildError, BuildResult, RowKind};
use crate::state::{
    BuilderState, Direction, JoinEntry, JoinSide, JoinType, Operator, OrderBy, TableSelection,
    WhereCondition,
};

macro_rules! trace_action {
    ($($field:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::trace!(target: "visql.state", $($field)*);
    };
}

/// Split `table.column` at the first `.`; both parts must be non-empty.
pub fn split_qualified(value: &str) -> BuildResult<(&str, &str)> {
    match value.split_once('.') {
        Some((table, column)) if !table.is_empty() && !column.is_empty() => Ok((table, column)),
        _ => Err(BuildError::InvalidQualifiedColumn(value.to_string())),
    }
}

/// Leading integer of `value` is negative (`"-5"`, `" -12abc"`).
fn has_negative_leading_int(value: &str) -> bool {
    let Some(rest) = value.trim_start().strip_prefix('-') else {
        return false;
    };
    let digits: &str = &rest[..rest.bytes().take_while(u8::is_ascii_digit).count()];
    digits.bytes().any(|b| b != b'0')
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

impl BuilderState {
    fn table_row_mut(&mut self, row: usize) -> BuildResult<&mut TableSelection> {
        self.tables
            .get_mut(row)
            .ok_or_else(|| BuildError::row_out_of_range(RowKind::Table, row))
    }

    fn join_row_mut(&mut self, row: usize) -> BuildResult<&mut JoinEntry> {
        self.joins
            .get_mut(row)
            .ok_or_else(|| BuildError::row_out_of_range(RowKind::Join, row))
    }

    fn where_row_mut(&mut self, row: usize) -> BuildResult<&mut WhereCondition> {
        self.conditions
            .get_mut(row)
            .ok_or_else(|| BuildError::row_out_of_range(RowKind::Where, row))
    }

    /// Non-empty `column`, checked against the qualified columns of the
    /// selected tables.
    fn selected_column(
        &self,
        catalog: &SchemaCatalog,
        column: Option<&str>,
    ) -> BuildResult<Option<String>> {
        let Some(column) = non_empty(column) else {
            return Ok(None);
        };
        split_qualified(&column)?;
        if !QueryAssembler::new(catalog)
            .qualified_columns(self)
            .contains(&column)
        {
            return Err(BuildError::ColumnNotSelected(column));
        }
        Ok(Some(column))
    }

    // ==================== Rows ====================

    /// Append an empty table row. Rejected once the row cap is reached.
    pub fn add_table_row(&self, catalog: &SchemaCatalog) -> BuildResult<Self> {
        let cap = QueryAssembler::new(catalog).table_row_cap(self);
        if self.tables.len() >= cap {
            return Err(BuildError::TableRowLimit(cap));
        }
        let mut next = self.clone();
        next.tables.push(TableSelection::default());
        trace_action!(rows = next.tables.len(), "add table row");
        Ok(next)
    }

    /// Append an empty `INNER` join row.
    pub fn add_join_row(&self) -> Self {
        let mut next = self.clone();
        next.joins.push(JoinEntry::default());
        trace_action!(rows = next.joins.len(), "add join row");
        next
    }

    /// Append an empty `=` where row.
    pub fn add_where_condition(&self) -> Self {
        let mut next = self.clone();
        next.conditions.push(WhereCondition::default());
        trace_action!(rows = next.conditions.len(), "add where row");
        next
    }

    // ==================== Tables & columns ====================

    /// Pick (or clear, with `None`) the table of a row.
    ///
    /// The table must be one the row's picker offers, computed as if the row
    /// were still empty. The row's columns are cleared, and every downstream
    /// selection (joins, where-conditions, group-by, order-by) goes back to
    /// its default. Limit and offset are kept.
    pub fn select_table(
        &self,
        catalog: &SchemaCatalog,
        row: usize,
        table: Option<&str>,
    ) -> BuildResult<Self> {
        let table = non_empty(table);
        if let Some(name) = &table {
            if !catalog.has_table(name) {
                return Err(BuildError::UnknownTable(name.clone()));
            }
        }

        let mut next = self.clone();
        let entry = next.table_row_mut(row)?;
        entry.table = None;
        entry.columns.clear();

        if let Some(name) = &table {
            let options = QueryAssembler::new(catalog).table_options(&next);
            if !options.iter().any(|t| t == name) {
                return Err(BuildError::TableNotEligible {
                    table: name.clone(),
                    row,
                });
            }
        }
        next.tables[row].table = table;

        next.joins = vec![JoinEntry::default()];
        next.conditions = vec![WhereCondition::default()];
        next.group_by = None;
        next.order_by = OrderBy::default();

        trace_action!(row, table = ?next.tables[row].table, "select table");
        Ok(next)
    }

    /// Replace the column set of a row. Columns must belong to the row's
    /// table; repeats are dropped.
    pub fn select_columns<S: AsRef<str>>(
        &self,
        catalog: &SchemaCatalog,
        row: usize,
        columns: &[S],
    ) -> BuildResult<Self> {
        let mut next = self.clone();
        let entry = next.table_row_mut(row)?;

        let mut picked: Vec<String> = Vec::with_capacity(columns.len());
        if !columns.is_empty() {
            let Some(table) = entry.table.as_deref().and_then(|t| catalog.table(t)) else {
                let table = entry.table.clone().unwrap_or_default();
                return Err(BuildError::unknown_column(table, columns[0].as_ref()));
            };
            for col in columns {
                let col = col.as_ref();
                if !table.has_column(col) {
                    return Err(BuildError::unknown_column(&table.name, col));
                }
                if !picked.iter().any(|c| c == col) {
                    picked.push(col.to_string());
                }
            }
        }
        entry.columns = picked;

        trace_action!(row, columns = ?next.tables[row].columns, "select columns");
        Ok(next)
    }

    // ==================== Joins ====================

    /// Set one side of a join from a qualified `table.column`, or clear it.
    ///
    /// Only columns shared by two related selected tables (the join endpoint
    /// options) are accepted.
    pub fn set_join_endpoint(
        &self,
        catalog: &SchemaCatalog,
        row: usize,
        side: JoinSide,
        qualified: Option<&str>,
    ) -> BuildResult<Self> {
        let parts = match qualified.filter(|q| !q.is_empty()) {
            Some(q) => {
                let (t, c) = split_qualified(q)?;
                let options = QueryAssembler::new(catalog).join_endpoint_options(self);
                if !options.iter().any(|o| o == q) {
                    return Err(BuildError::InvalidJoinEndpoint(q.to_string()));
                }
                Some((t.to_string(), c.to_string()))
            }
            None => None,
        };
        let (table, column) = parts.unzip();

        let mut next = self.clone();
        let join = next.join_row_mut(row)?;
        match side {
            JoinSide::Left => {
                join.table1 = table;
                join.column1 = column;
            }
            JoinSide::Right => {
                join.table2 = table;
                join.column2 = column;
            }
        }

        trace_action!(row, ?side, endpoint = ?qualified, "set join endpoint");
        Ok(next)
    }

    /// Set (or clear) the join type of a row.
    pub fn set_join_type(&self, row: usize, join_type: Option<JoinType>) -> BuildResult<Self> {
        let mut next = self.clone();
        next.join_row_mut(row)?.join_type = join_type;
        trace_action!(row, ?join_type, "set join type");
        Ok(next)
    }

    // ==================== Where ====================

    /// Set (or clear) the qualified column of a where row. The column must
    /// belong to a selected table.
    pub fn set_where_column(
        &self,
        catalog: &SchemaCatalog,
        row: usize,
        column: Option<&str>,
    ) -> BuildResult<Self> {
        let column = self.selected_column(catalog, column)?;
        let mut next = self.clone();
        next.where_row_mut(row)?.column1 = column;
        trace_action!(row, column = ?next.conditions[row].column1, "set where column");
        Ok(next)
    }

    /// Set the operator of a where row. NULL checks clear the value.
    pub fn set_where_operator(&self, row: usize, operator: Operator) -> BuildResult<Self> {
        let mut next = self.clone();
        let cond = next.where_row_mut(row)?;
        cond.operator = operator;
        if operator.is_null_check() {
            cond.column2.clear();
        }
        trace_action!(row, operator = %operator, "set where operator");
        Ok(next)
    }

    /// Set the literal value of a where row.
    ///
    /// A value starting with a negative integer is replaced by the empty
    /// string. Rows with a NULL-check operator keep an empty value.
    pub fn set_where_value(&self, row: usize, value: &str) -> BuildResult<Self> {
        let mut next = self.clone();
        let cond = next.where_row_mut(row)?;
        if cond.operator.is_null_check() || has_negative_leading_int(value) {
            cond.column2.clear();
        } else {
            cond.column2 = value.to_string();
        }
        trace_action!(row, value = %next.conditions[row].column2, "set where value");
        Ok(next)
    }

    // ==================== Group / order ====================

    pub fn set_group_by(
        &self,
        catalog: &SchemaCatalog,
        column: Option<&str>,
    ) -> BuildResult<Self> {
        let column = self.selected_column(catalog, column)?;
        let mut next = self.clone();
        next.group_by = column;
        trace_action!(group_by = ?next.group_by, "set group by");
        Ok(next)
    }

    pub fn set_order_column(
        &self,
        catalog: &SchemaCatalog,
        column: Option<&str>,
    ) -> BuildResult<Self> {
        let column = self.selected_column(catalog, column)?;
        let mut next = self.clone();
        next.order_by.column = column;
        trace_action!(order_by = ?next.order_by.column, "set order column");
        Ok(next)
    }

    pub fn set_order_direction(&self, direction: Direction) -> Self {
        let mut next = self.clone();
        next.order_by.direction = direction;
        trace_action!(direction = %direction, "set order direction");
        next
    }

    // ==================== Pagination ====================

    /// Set (or clear) the limit. Zero is rejected.
    ///
    /// An offset that no longer fits under the new limit is cleared.
    pub fn set_limit(&self, limit: Option<u64>) -> BuildResult<Self> {
        if limit == Some(0) {
            return Err(BuildError::InvalidLimit(0));
        }
        let mut next = self.clone();
        next.limit = limit;
        if let Some(offset) = next.offset {
            if limit.is_none_or(|l| offset > l) {
                next.offset = None;
            }
        }
        trace_action!(?limit, offset = ?next.offset, "set limit");
        Ok(next)
    }

    /// Set (or clear) the offset. Requires a limit and `offset <= limit`.
    pub fn set_offset(&self, offset: Option<u64>) -> BuildResult<Self> {
        if let Some(n) = offset {
            match self.limit {
                Some(limit) if n <= limit => {}
                limit => return Err(BuildError::InvalidOffset { offset: n, limit }),
            }
        }
        let mut next = self.clone();
        next.offset = offset;
        trace_action!(?offset, "set offset");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> SchemaCatalog {
        SchemaCatalog::demo()
    }

    fn two_tables() -> BuilderState {
        let c = catalog();
        BuilderState::new()
            .select_table(&c, 0, Some("Categories"))
            .unwrap()
            .add_table_row(&c)
            .unwrap()
            .select_table(&c, 1, Some("Products"))
            .unwrap()
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("a.b").unwrap(), ("a", "b"));
        assert_eq!(split_qualified("s.t.c").unwrap(), ("s", "t.c"));
        assert!(split_qualified("nodot").is_err());
        assert!(split_qualified(".c").is_err());
        assert!(split_qualified("t.").is_err());
    }

    #[test]
    fn test_negative_leading_int() {
        assert!(has_negative_leading_int("-5"));
        assert!(has_negative_leading_int("  -12abc"));
        assert!(!has_negative_leading_int("-0"));
        assert!(!has_negative_leading_int("-abc"));
        assert!(!has_negative_leading_int("5"));
        assert!(!has_negative_leading_int("'x-1'"));
    }

    #[test]
    fn test_select_table_clears_columns() {
        let c = catalog();
        let state = BuilderState::new()
            .select_table(&c, 0, Some("Categories"))
            .unwrap()
            .select_columns(&c, 0, &["CategoryID"])
            .unwrap();
        assert_eq!(state.tables[0].columns, ["CategoryID"]);

        let state = state.select_table(&c, 0, Some("Products")).unwrap();
        assert_eq!(state.tables[0].table.as_deref(), Some("Products"));
        assert!(state.tables[0].columns.is_empty());
    }

    #[test]
    fn test_select_table_resets_downstream() {
        let c = catalog();
        let state = two_tables()
            .set_join_endpoint(&c, 0, JoinSide::Left, Some("Categories.CategoryID"))
            .unwrap()
            .add_join_row()
            .add_where_condition()
            .set_where_column(&c, 0, Some("Products.Price"))
            .unwrap()
            .set_where_value(0, "3")
            .unwrap()
            .set_group_by(&c, Some("Products.CategoryID"))
            .unwrap()
            .set_order_column(&c, Some("Products.Price"))
            .unwrap()
            .set_order_direction(Direction::Desc)
            .set_limit(Some(10))
            .unwrap()
            .set_offset(Some(5))
            .unwrap();

        let reset = state.select_table(&c, 1, Some("Products")).unwrap();
        assert_eq!(reset.joins, vec![JoinEntry::default()]);
        assert_eq!(reset.conditions, vec![WhereCondition::default()]);
        assert_eq!(reset.group_by, None);
        assert_eq!(reset.order_by, OrderBy::default());
        assert_eq!(reset.limit, Some(10));
        assert_eq!(reset.offset, Some(5));
        // The original value is untouched.
        assert_eq!(state.joins.len(), 2);
    }

    #[test]
    fn test_select_table_rejects_unknown() {
        let c = catalog();
        let state = BuilderState::new();
        assert_eq!(
            state.select_table(&c, 0, Some("Users")).unwrap_err(),
            BuildError::UnknownTable("Users".into())
        );
        assert_eq!(
            state.select_table(&c, 3, Some("Orders")).unwrap_err(),
            BuildError::row_out_of_range(RowKind::Table, 3)
        );
    }

    #[test]
    fn test_select_table_none_clears() {
        let c = catalog();
        let state = BuilderState::new()
            .select_table(&c, 0, Some("Orders"))
            .unwrap()
            .select_table(&c, 0, Some(""))
            .unwrap();
        assert_eq!(state.tables[0].table, None);
    }

    #[test]
    fn test_select_columns_validates() {
        let c = catalog();
        let state = BuilderState::new()
            .select_table(&c, 0, Some("Orders"))
            .unwrap();
        let err = state.select_columns(&c, 0, &["Price"]).unwrap_err();
        assert_eq!(err, BuildError::unknown_column("Orders", "Price"));

        let state = state
            .select_columns(&c, 0, &["Quantity", "OrderID", "Quantity"])
            .unwrap();
        assert_eq!(state.tables[0].columns, ["Quantity", "OrderID"]);

        let empty: [&str; 0] = [];
        let cleared = state.select_columns(&c, 0, &empty).unwrap();
        assert!(cleared.tables[0].columns.is_empty());
    }

    #[test]
    fn test_select_columns_without_table() {
        let c = catalog();
        let err = BuilderState::new()
            .select_columns(&c, 0, &["OrderID"])
            .unwrap_err();
        assert_eq!(err, BuildError::unknown_column("", "OrderID"));
    }

    #[test]
    fn test_join_endpoints() {
        let c = catalog();
        let state = two_tables()
            .set_join_endpoint(&c, 0, JoinSide::Left, Some("Categories.CategoryID"))
            .unwrap()
            .set_join_endpoint(&c, 0, JoinSide::Right, Some("Products.CategoryID"))
            .unwrap();
        let join = &state.joins[0];
        assert_eq!(join.table1.as_deref(), Some("Categories"));
        assert_eq!(join.column2.as_deref(), Some("CategoryID"));
        assert!(join.is_complete());

        let cleared = state
            .set_join_endpoint(&c, 0, JoinSide::Right, None)
            .unwrap();
        assert_eq!(cleared.joins[0].table2, None);
        assert_eq!(cleared.joins[0].column2, None);

        assert!(matches!(
            state.set_join_endpoint(&c, 0, JoinSide::Left, Some("bogus")),
            Err(BuildError::InvalidQualifiedColumn(_))
        ));
    }

    #[test]
    fn test_join_type() {
        let state = two_tables().set_join_type(0, Some(JoinType::Full)).unwrap();
        assert_eq!(state.joins[0].join_type, Some(JoinType::Full));
        let state = state.set_join_type(0, None).unwrap();
        assert_eq!(state.joins[0].join_type, None);
        assert!(state.set_join_type(1, None).is_err());
    }

    #[test]
    fn test_null_operator_clears_value() {
        let c = catalog();
        let state = BuilderState::new()
            .select_table(&c, 0, Some("Orders"))
            .unwrap()
            .set_where_column(&c, 0, Some("Orders.Quantity"))
            .unwrap()
            .set_where_value(0, "4")
            .unwrap()
            .set_where_operator(0, Operator::IsNotNull)
            .unwrap();
        assert_eq!(state.conditions[0].column2, "");

        let state = state.set_where_value(0, "9").unwrap();
        assert_eq!(state.conditions[0].column2, "");
    }

    #[test]
    fn test_negative_where_value_is_dropped() {
        let state = BuilderState::new()
            .set_where_value(0, "-3")
            .unwrap();
        assert_eq!(state.conditions[0].column2, "");
        let state = state.set_where_value(0, "'abc'").unwrap();
        assert_eq!(state.conditions[0].column2, "'abc'");
    }

    #[test]
    fn test_limit_rules() {
        let state = BuilderState::new();
        assert_eq!(state.set_limit(Some(0)).unwrap_err(), BuildError::InvalidLimit(0));
        let state = state.set_limit(Some(10)).unwrap();
        assert_eq!(state.limit, Some(10));
    }

    #[test]
    fn test_offset_rules() {
        let state = BuilderState::new();
        assert_eq!(
            state.set_offset(Some(0)).unwrap_err(),
            BuildError::InvalidOffset {
                offset: 0,
                limit: None
            }
        );

        let state = state.set_limit(Some(10)).unwrap();
        assert!(state.set_offset(Some(11)).is_err());
        let state = state.set_offset(Some(10)).unwrap();
        assert_eq!(state.offset, Some(10));
        let state = state.set_offset(Some(0)).unwrap();
        assert_eq!(state.offset, Some(0));
    }

    #[test]
    fn test_lowering_limit_drops_offset() {
        let state = BuilderState::new()
            .set_limit(Some(10))
            .unwrap()
            .set_offset(Some(8))
            .unwrap();
        assert_eq!(state.set_limit(Some(8)).unwrap().offset, Some(8));
        assert_eq!(state.set_limit(Some(5)).unwrap().offset, None);
        assert_eq!(state.set_limit(None).unwrap().offset, None);
    }

    #[test]
    fn test_group_and_order() {
        let c = catalog();
        let state = BuilderState::new()
            .select_table(&c, 0, Some("Orders"))
            .unwrap()
            .set_group_by(&c, Some("Orders.ProductID"))
            .unwrap()
            .set_order_column(&c, Some("Orders.OrderDate"))
            .unwrap()
            .set_order_direction(Direction::Desc);
        assert_eq!(state.group_by.as_deref(), Some("Orders.ProductID"));
        assert_eq!(state.order_by.column.as_deref(), Some("Orders.OrderDate"));
        assert_eq!(state.set_group_by(&c, Some("")).unwrap().group_by, None);
    }

    #[test]
    fn test_columns_must_belong_to_selected_tables() {
        let c = catalog();
        let state = two_tables();

        for column in ["Users.email", "Orders.Quantity", "Products.Nope"] {
            let expected = BuildError::ColumnNotSelected(column.to_string());
            assert_eq!(state.set_where_column(&c, 0, Some(column)).unwrap_err(), expected);
            assert_eq!(state.set_group_by(&c, Some(column)).unwrap_err(), expected);
            assert_eq!(state.set_order_column(&c, Some(column)).unwrap_err(), expected);
        }
        assert!(matches!(
            state.set_group_by(&c, Some("nodot")),
            Err(BuildError::InvalidQualifiedColumn(_))
        ));

        // Nothing selected: nothing is available.
        assert!(BuilderState::new()
            .set_where_column(&c, 0, Some("Orders.Quantity"))
            .is_err());
        // Clearing is always allowed.
        assert_eq!(
            state.set_where_column(&c, 0, None).unwrap().conditions[0].column1,
            None
        );
    }

    #[test]
    fn test_join_endpoint_must_be_offered() {
        let c = catalog();
        let state = two_tables();
        for endpoint in ["Ghosts.Nope", "Orders.Quantity", "Categories.CategoryName"] {
            assert_eq!(
                state
                    .set_join_endpoint(&c, 0, JoinSide::Left, Some(endpoint))
                    .unwrap_err(),
                BuildError::InvalidJoinEndpoint(endpoint.to_string())
            );
        }
        // Single table: no join columns at all.
        let single = BuilderState::new()
            .select_table(&c, 0, Some("Products"))
            .unwrap();
        assert!(single
            .set_join_endpoint(&c, 0, JoinSide::Right, Some("Products.CategoryID"))
            .is_err());
    }

    #[test]
    fn test_select_table_follows_picker() {
        let c = catalog();
        let state = BuilderState::new()
            .select_table(&c, 0, Some("Products"))
            .unwrap()
            .add_table_row(&c)
            .unwrap();

        // Only the related, unpicked table is offered on row 1.
        assert_eq!(
            state.select_table(&c, 1, Some("Products")).unwrap_err(),
            BuildError::TableNotEligible {
                table: "Products".into(),
                row: 1
            }
        );
        assert!(state.select_table(&c, 1, Some("Categories")).is_err());
        let state = state.select_table(&c, 1, Some("Orders")).unwrap();

        // Re-picking a row's own table is fine; the row is judged as if empty.
        assert!(state.select_table(&c, 1, Some("Orders")).is_ok());
    }

    #[test]
    fn test_add_table_row_respects_cap() {
        let c = catalog();
        // Non-leaf first table: cap is max_fan_out + 2 = 3 rows.
        let state = two_tables().add_table_row(&c).unwrap();
        assert_eq!(state.tables.len(), 3);
        assert_eq!(
            state.add_table_row(&c).unwrap_err(),
            BuildError::TableRowLimit(3)
        );

        // Leaf first table: cap is max_fan_out + 1 = 2 rows.
        let leaf = BuilderState::new()
            .select_table(&c, 0, Some("Orders"))
            .unwrap()
            .add_table_row(&c)
            .unwrap();
        assert_eq!(
            leaf.add_table_row(&c).unwrap_err(),
            BuildError::TableRowLimit(2)
        );
    }
}
