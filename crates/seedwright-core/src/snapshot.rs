use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Read-only schema snapshot supplied by the external introspector.
///
/// The engine never queries columns or relationships itself; everything it
/// knows about the schema arrives through this value, immutable for the
/// lifetime of a detection run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SchemaSnapshot {
    pub tables: Vec<TableInfo>,
    pub relationships: Vec<RelationshipInfo>,
    pub integrity_rules: Vec<IntegrityRule>,
}

/// A table and its columns as captured by the introspector.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

/// Column metadata, reduced to what classification needs.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

/// A relationship between two tables.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RelationshipInfo {
    pub from_table: String,
    pub to_table: String,
    pub column: String,
    pub kind: RelationshipKind,
}

/// Kind of relationship captured by the introspector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    OneToOne,
    OneToMany,
    ManyToMany,
}

/// A normalized integrity rule (constraint) on a table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IntegrityRule {
    pub table: String,
    pub name: String,
    pub condition: String,
    pub rule_type: String,
}

impl SchemaSnapshot {
    /// Snapshot with no tables, used as the degraded default when the
    /// external introspector fails.
    pub fn empty() -> Self {
        Self {
            tables: Vec::new(),
            relationships: Vec::new(),
            integrity_rules: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Sorted table names, lowercased for signal matching.
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .iter()
            .map(|table| table.name.to_lowercase())
            .collect();
        names.sort();
        names
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables
            .iter()
            .any(|table| table.name.eq_ignore_ascii_case(name))
    }

    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.tables
            .iter()
            .find(|table| table.name.eq_ignore_ascii_case(name))
    }

    /// True when any table carries a column with the given name.
    pub fn has_column(&self, column: &str) -> bool {
        self.tables.iter().any(|table| {
            table
                .columns
                .iter()
                .any(|col| col.name.eq_ignore_ascii_case(column))
        })
    }

    /// True when the named table carries the named column.
    pub fn table_has_column(&self, table: &str, column: &str) -> bool {
        self.table(table)
            .map(|table| {
                table
                    .columns
                    .iter()
                    .any(|col| col.name.eq_ignore_ascii_case(column))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SchemaSnapshot {
        SchemaSnapshot {
            tables: vec![TableInfo {
                name: "Accounts".to_string(),
                columns: vec![ColumnInfo {
                    name: "slug".to_string(),
                    data_type: "text".to_string(),
                    is_nullable: true,
                }],
            }],
            relationships: Vec::new(),
            integrity_rules: Vec::new(),
        }
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let snapshot = snapshot();
        assert!(snapshot.has_table("accounts"));
        assert!(snapshot.table_has_column("accounts", "SLUG"));
        assert!(!snapshot.table_has_column("accounts", "missing"));
    }

    #[test]
    fn table_names_are_sorted_and_lowercased() {
        let snapshot = snapshot();
        assert_eq!(snapshot.table_names(), vec!["accounts".to_string()]);
    }
}
