//! Declarative query recipes.
//!
//! A recipe lists what a user would pick in the form. [`Recipe::replay`]
//! feeds it through the action handlers in form order, so every input rule
//! that applies interactively applies here too.
//!
//! ```toml
//! group_by = "Products.CategoryID"
//! limit = 10
//!
//! [[tables]]
//! table = "Categories"
//! columns = ["CategoryName"]
//!
//! [[tables]]
//! table = "Products"
//! columns = ["ProductName"]
//!
//! [[joins]]
//! left = "Categories.CategoryID"
//! right = "Products.CategoryID"
//! type = "LEFT"
//!
//! [[where]]
//! column = "Products.Price"
//! operator = ">"
//! value = "100"
//!
//! [order_by]
//! column = "Products.ProductName"
//! direction = "DESC"
//! ```

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use visql::{BuilderState, Direction, JoinSide, JoinType, Operator, SchemaCatalog};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    #[serde(default)]
    pub tables: Vec<TableStep>,
    #[serde(default)]
    pub joins: Vec<JoinStep>,
    #[serde(default, rename = "where")]
    pub conditions: Vec<WhereStep>,
    pub group_by: Option<String>,
    pub order_by: Option<OrderStep>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableStep {
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinStep {
    pub left: Option<String>,
    pub right: Option<String>,
    /// Omitted means the row keeps its default (`INNER`).
    #[serde(rename = "type")]
    pub join_type: Option<JoinType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WhereStep {
    pub column: Option<String>,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderStep {
    pub column: Option<String>,
    #[serde(default)]
    pub direction: Direction,
}

impl Recipe {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read recipe {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid recipe {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply every step to a fresh state, in form order.
    pub fn replay(&self, catalog: &SchemaCatalog) -> anyhow::Result<BuilderState> {
        let mut state = BuilderState::new();

        for (row, step) in self.tables.iter().enumerate() {
            if row > 0 {
                state = state
                    .add_table_row(catalog)
                    .with_context(|| format!("tables[{row}]"))?;
            }
            state = state
                .select_table(catalog, row, Some(step.table.as_str()))
                .and_then(|s| s.select_columns(catalog, row, step.columns.as_slice()))
                .with_context(|| format!("tables[{row}]"))?;
        }

        for (row, step) in self.joins.iter().enumerate() {
            if row > 0 {
                state = state.add_join_row();
            }
            state = state
                .set_join_endpoint(catalog, row, JoinSide::Left, step.left.as_deref())
                .and_then(|s| {
                    s.set_join_endpoint(catalog, row, JoinSide::Right, step.right.as_deref())
                })
                .with_context(|| format!("joins[{row}]"))?;
            if let Some(join_type) = step.join_type {
                state = state.set_join_type(row, Some(join_type))?;
            }
        }

        for (row, step) in self.conditions.iter().enumerate() {
            if row > 0 {
                state = state.add_where_condition();
            }
            state = state
                .set_where_column(catalog, row, step.column.as_deref())
                .and_then(|s| s.set_where_operator(row, step.operator))
                .and_then(|s| s.set_where_value(row, &step.value))
                .with_context(|| format!("where[{row}]"))?;
        }

        state = state
            .set_group_by(catalog, self.group_by.as_deref())
            .context("group_by")?;
        if let Some(order) = &self.order_by {
            state = state
                .set_order_column(catalog, order.column.as_deref())
                .context("order_by")?
                .set_order_direction(order.direction);
        }

        state = state
            .set_limit(self.limit)
            .and_then(|s| s.set_offset(self.offset))
            .context("limit/offset")?;

        Ok(state)
    }
}
