//! Static schema catalog: tables, their columns, and which tables may be joined.
//!
//! Every lookup degrades to an empty result on unknown input, so the catalog
//! never fails once it has been built. Construction checks that the
//! relationship map only names tables that exist.
//!
//! # Example
//!
//! ```
//! use visql::SchemaCatalog;
//!
//! let catalog = SchemaCatalog::builder()
//!     .table("users", &["id", "name"])
//!     .table("orders", &["id", "user_id"])
//!     .relate("users", &["orders"])
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(catalog.columns_of("users"), ["id", "name"]);
//! assert_eq!(catalog.related_tables("users"), ["orders"]);
//! assert!(catalog.related_tables("nope").is_empty());
//! ```

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A table and its ordered column list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Table name.
    pub name: String,
    /// Column names in declaration order.
    pub columns: Vec<String>,
}

impl Table {
    /// Create a table from a name and column list.
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Check if this table has a column with the given name.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}

/// Raw catalog layout as it appears in config files.
#[derive(Debug, Clone, Default, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tables: Vec<Table>,
    #[serde(default)]
    relationships: BTreeMap<String, Vec<String>>,
}

/// Fixed set of tables plus the table relationship graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CatalogFile")]
pub struct SchemaCatalog {
    tables: Vec<Table>,
    relationships: BTreeMap<String, Vec<String>>,
}

impl TryFrom<CatalogFile> for SchemaCatalog {
    type Error = BuildError;

    fn try_from(file: CatalogFile) -> BuildResult<Self> {
        Self::new(file.tables, file.relationships)
    }
}

impl SchemaCatalog {
    /// Build a catalog, checking table names are unique and every
    /// relationship key or member names a known table.
    pub fn new(
        tables: Vec<Table>,
        relationships: BTreeMap<String, Vec<String>>,
    ) -> BuildResult<Self> {
        let mut seen = HashSet::with_capacity(tables.len());
        for t in &tables {
            if !seen.insert(t.name.as_str()) {
                return Err(BuildError::DuplicateTable(t.name.clone()));
            }
        }

        for (from, targets) in &relationships {
            if !seen.contains(from.as_str()) {
                return Err(BuildError::UnknownRelationship {
                    from: from.clone(),
                    to: targets.first().cloned().unwrap_or_default(),
                });
            }
            if let Some(to) = targets.iter().find(|t| !seen.contains(t.as_str())) {
                return Err(BuildError::UnknownRelationship {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
        }

        Ok(Self {
            tables,
            relationships,
        })
    }

    /// Start building a catalog.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// The built-in demo catalog: `Categories -> Products -> Orders`.
    pub fn demo() -> Self {
        let mut relationships = BTreeMap::new();
        relationships.insert("Categories".to_string(), vec!["Products".to_string()]);
        relationships.insert("Products".to_string(), vec!["Orders".to_string()]);
        relationships.insert("Orders".to_string(), Vec::new());

        Self {
            tables: vec![
                Table::new("Categories", &["CategoryID", "CategoryName"]),
                Table::new("Products", &["ProductID", "ProductName", "Price", "CategoryID"]),
                Table::new("Orders", &["OrderID", "ProductID", "Quantity", "OrderDate"]),
            ],
            relationships,
        }
    }

    /// All tables, in declaration order.
    pub fn list_tables(&self) -> &[Table] {
        &self.tables
    }

    /// Table names, in declaration order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name.as_str())
    }

    /// Get a table by name.
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Check if a table exists.
    pub fn has_table(&self, name: &str) -> bool {
        self.table(name).is_some()
    }

    /// Columns of a table; empty if the table is unknown.
    pub fn columns_of(&self, name: &str) -> &[String] {
        self.table(name).map(|t| t.columns.as_slice()).unwrap_or(&[])
    }

    /// Tables declared joinable from `name`; empty if none are declared.
    pub fn related_tables(&self, name: &str) -> &[String] {
        self.relationships
            .get(name)
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    /// The full relationship map.
    pub fn relationships(&self) -> &BTreeMap<String, Vec<String>> {
        &self.relationships
    }

    /// Largest number of relationships declared for a single table.
    pub fn max_fan_out(&self) -> usize {
        self.relationships.values().map(Vec::len).max().unwrap_or(0)
    }

    /// A known table with no outgoing relationships.
    pub fn is_leaf(&self, name: &str) -> bool {
        self.has_table(name) && self.related_tables(name).is_empty()
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::demo()
    }
}

/// Incremental [`SchemaCatalog`] construction.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    tables: Vec<Table>,
    relationships: BTreeMap<String, Vec<String>>,
}

impl CatalogBuilder {
    /// Add a table.
    pub fn table(mut self, name: &str, columns: &[&str]) -> Self {
        self.tables.push(Table::new(name, columns));
        self
    }

    /// Declare `from` joinable with each of `to`.
    pub fn relate(mut self, from: &str, to: &[&str]) -> Self {
        let targets = self.relationships.entry(from.to_string()).or_default();
        for t in to {
            if !targets.iter().any(|x| x == t) {
                targets.push(t.to_string());
            }
        }
        self
    }

    /// Validate and build the catalog.
    pub fn build(self) -> BuildResult<SchemaCatalog> {
        SchemaCatalog::new(self.tables, self.relationships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_lookups() {
        let catalog = SchemaCatalog::demo();
        let names: Vec<_> = catalog.table_names().collect();
        assert_eq!(names, ["Categories", "Products", "Orders"]);
        assert_eq!(catalog.columns_of("Categories"), ["CategoryID", "CategoryName"]);
        assert_eq!(catalog.related_tables("Products"), ["Orders"]);
        assert!(catalog.related_tables("Orders").is_empty());
        assert_eq!(catalog.max_fan_out(), 1);
    }

    #[test]
    fn unknown_names_degrade_to_empty() {
        let catalog = SchemaCatalog::demo();
        assert!(catalog.columns_of("Nope").is_empty());
        assert!(catalog.related_tables("Nope").is_empty());
        assert!(catalog.columns_of("").is_empty());
    }

    #[test]
    fn leaf_tables() {
        let catalog = SchemaCatalog::demo();
        assert!(catalog.is_leaf("Orders"));
        assert!(!catalog.is_leaf("Categories"));
        assert!(!catalog.is_leaf(""));
    }

    #[test]
    fn rejects_unknown_relationship_member() {
        let err = SchemaCatalog::builder()
            .table("a", &["id"])
            .relate("a", &["b"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            BuildError::UnknownRelationship {
                from: "a".into(),
                to: "b".into()
            }
        );
    }

    #[test]
    fn rejects_unknown_relationship_key() {
        let err = SchemaCatalog::builder()
            .table("a", &["id"])
            .relate("z", &["a"])
            .build()
            .unwrap_err();
        assert!(matches!(err, BuildError::UnknownRelationship { from, .. } if from == "z"));
    }

    #[test]
    fn rejects_duplicate_tables() {
        let err = SchemaCatalog::builder()
            .table("a", &["id"])
            .table("a", &["other"])
            .build()
            .unwrap_err();
        assert_eq!(err, BuildError::DuplicateTable("a".into()));
    }

    #[test]
    fn relate_dedups_targets() {
        let catalog = SchemaCatalog::builder()
            .table("a", &["id"])
            .table("b", &["id"])
            .table("c", &["id"])
            .relate("a", &["b", "c"])
            .relate("a", &["b"])
            .build()
            .unwrap();
        assert_eq!(catalog.related_tables("a"), ["b", "c"]);
        assert_eq!(catalog.max_fan_out(), 2);
    }
}
