//! Query assembly: option lists for the form pickers, validation, and SQL
//! rendering.
//!
//! Everything here is a pure function of the catalog and a [`BuilderState`].

use crate::catalog::SchemaCatalog;
use crate::error::{BuildError, BuildResult};
use crate::state::BuilderState;

/// Computes picker options and renders SQL for a state, against one catalog.
#[derive(Debug, Clone, Copy)]
pub struct QueryAssembler<'a> {
    catalog: &'a SchemaCatalog,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    max_sql_length: Option<usize>,
}

impl<'a> QueryAssembler<'a> {
    pub fn new(catalog: &'a SchemaCatalog) -> Self {
        Self {
            catalog,
            max_sql_length: Some(200),
        }
    }

    /// Set maximum SQL length written to debug logs.
    pub fn with_max_sql_length(mut self, len: Option<usize>) -> Self {
        self.max_sql_length = len;
        self
    }

    pub fn catalog(&self) -> &'a SchemaCatalog {
        self.catalog
    }

    // ==================== Picker options ====================

    /// Tables that may be picked on a table row.
    ///
    /// The number of table rows is capped at `max_fan_out + 1` when the first
    /// row holds a leaf table and at `max_fan_out + 2` otherwise; at the cap
    /// nothing is eligible. Below it, a single-row form (or a form with no
    /// table picked yet) may pick any table. Otherwise the unpicked tables
    /// related to a picked one are offered, falling back to every unpicked
    /// table when none is related.
    pub fn table_options(&self, state: &BuilderState) -> Vec<String> {
        let rows = state.tables.len();
        if rows >= self.table_row_cap(state) {
            return Vec::new();
        }

        let all = self.catalog.table_names();
        if rows == 1 || state.selected_count() == 0 {
            return all.map(str::to_string).collect();
        }

        let related: Vec<&str> = state
            .selected_tables()
            .flat_map(|t| self.catalog.related_tables(t))
            .map(String::as_str)
            .collect();

        let unpicked: Vec<&str> = all.filter(|t| !state.is_selected(t)).collect();
        let available: Vec<String> = unpicked
            .iter()
            .filter(|t| related.contains(*t))
            .map(|t| t.to_string())
            .collect();
        if !available.is_empty() {
            return available;
        }

        unpicked.into_iter().map(str::to_string).collect()
    }

    /// Row count at which the table pickers go empty and no further table
    /// row may be added.
    pub fn table_row_cap(&self, state: &BuilderState) -> usize {
        let max_rows = self.catalog.max_fan_out() + 1;
        let first_is_leaf = state
            .first_table()
            .is_some_and(|t| self.catalog.is_leaf(t));
        if first_is_leaf { max_rows } else { max_rows + 1 }
    }

    /// Qualified `table.column` candidates for join endpoints.
    ///
    /// For every picked table and every related table that is also picked,
    /// each column name present in both tables is offered on both sides.
    pub fn join_endpoint_options(&self, state: &BuilderState) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let mut push = |s: String| {
            if !out.contains(&s) {
                out.push(s);
            }
        };

        for name in state.selected_tables() {
            let Some(table) = self.catalog.table(name) else {
                continue;
            };
            for related_name in self.catalog.related_tables(name) {
                if !state.is_selected(related_name) {
                    continue;
                }
                let Some(related) = self.catalog.table(related_name) else {
                    continue;
                };
                for column in &table.columns {
                    if related.has_column(column) {
                        push(format!("{}.{}", table.name, column));
                        push(format!("{}.{}", related.name, column));
                    }
                }
            }
        }

        out
    }

    /// Every column of every picked table as `table.column`, in row order
    /// then column order.
    pub fn qualified_columns(&self, state: &BuilderState) -> Vec<String> {
        let mut seen: Vec<&str> = Vec::new();
        let mut out = Vec::new();
        for name in state.selected_tables() {
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            for column in self.catalog.columns_of(name) {
                out.push(format!("{name}.{column}"));
            }
        }
        out
    }

    // ==================== Validate & render ====================

    /// Check the state against the named validation rules.
    pub fn validate(&self, state: &BuilderState) -> BuildResult<()> {
        let result = check(state);
        if let Err(_err) = &result {
            #[cfg(feature = "tracing")]
            tracing::debug!(target: "visql.validate", failure = _err.name(), "query rejected");
        }
        result
    }

    /// Validate and render the state.
    ///
    /// Returns `Ok(None)` when validation passes but the form is not ready to
    /// show a query: several tables are picked and no join has both endpoints
    /// and a join type.
    pub fn generate(&self, state: &BuilderState) -> BuildResult<Option<String>> {
        self.validate(state)?;

        let sql = render(state);

        let selected = state.selected_count();
        let ready = selected == 1 || (selected > 1 && state.joins.iter().any(|j| j.is_complete()));
        if !ready {
            #[cfg(feature = "tracing")]
            tracing::debug!(target: "visql.sql", selected, "no complete join; query withheld");
            return Ok(None);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(target: "visql.sql", sql = %self.truncate_sql(&sql), "generated query");
        Ok(Some(sql))
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    fn truncate_sql<'s>(&self, sql: &'s str) -> std::borrow::Cow<'s, str> {
        match self.max_sql_length {
            Some(max) if sql.len() > max => {
                let mut end = max;
                while !sql.is_char_boundary(end) {
                    end -= 1;
                }
                format!("{}...", &sql[..end]).into()
            }
            _ => sql.into(),
        }
    }
}

fn check(state: &BuilderState) -> BuildResult<()> {
    if state.first_table().is_none() {
        return Err(BuildError::NoTableSelected);
    }
    // Looks at row 1 whenever it exists, whatever the caller meant to pick.
    if state.tables.get(1).is_some_and(|row| !row.is_set()) {
        return Err(BuildError::SecondTableMissing);
    }
    if state.selected_count() > 1 && !state.joins.iter().any(|j| j.has_endpoints()) {
        return Err(BuildError::JoinsRequired);
    }
    if state.conditions.iter().any(|c| c.is_missing_value()) {
        return Err(BuildError::MissingWhereValue);
    }
    Ok(())
}

/// Render the SELECT for a state that passed [`check`].
fn render(state: &BuilderState) -> String {
    let columns: Vec<String> = state
        .tables
        .iter()
        .filter_map(|row| row.table_name().map(|t| (t, &row.columns)))
        .flat_map(|(table, cols)| cols.iter().map(move |c| format!("{table}.{c}")))
        .collect();

    let mut sql = String::from("SELECT ");
    if columns.is_empty() {
        sql.push('*');
    } else {
        sql.push_str(&columns.join(", "));
    }

    if let Some(from) = state.first_table() {
        sql.push_str(" FROM ");
        sql.push_str(from);
    }

    for join in &state.joins {
        if let (Some(t1), Some(c1), Some(t2), Some(c2), Some(kind)) = (
            &join.table1,
            &join.column1,
            &join.table2,
            &join.column2,
            join.join_type,
        ) {
            sql.push_str(&format!(" {kind} JOIN {t2} ON {t1}.{c1} = {t2}.{c2}"));
        }
    }

    let conditions: Vec<String> = state
        .conditions
        .iter()
        .filter_map(|cond| {
            let column = cond.column1.as_deref().filter(|c| !c.is_empty())?;
            Some(if cond.operator.is_null_check() {
                format!("{column} {}", cond.operator)
            } else {
                format!("{column} {} {}", cond.operator, cond.column2)
            })
        })
        .collect();
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }

    if let Some(group) = &state.group_by {
        sql.push_str(" GROUP BY ");
        sql.push_str(group);
    }

    if let Some(column) = &state.order_by.column {
        sql.push_str(&format!(" ORDER BY {} {}", column, state.order_by.direction));
    }

    if let Some(limit) = state.limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    if let Some(offset) = state.offset {
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    sql
}
