use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use seedwright_core::IntegrityRule;

/// A candidate row: column name to JSON value, deterministically ordered.
pub type Row = BTreeMap<String, Value>;

/// Recognizable constraint shapes a handler can match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    NotNull,
    ForeignKey,
    Unique,
    Check,
    BusinessRule,
}

/// One constraint to satisfy before a row is inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintDescriptor {
    pub constraint_type: ConstraintType,
    pub table: String,
    pub columns: Vec<String>,
    /// Raw SQL-ish expression for CHECK constraints and business rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    /// Parent table for foreign keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_table: Option<String>,
    pub name: String,
}

impl ConstraintDescriptor {
    /// Map an introspected integrity rule into a handler-dispatchable
    /// descriptor. Unrecognized rule types land on the business-rule
    /// handlers.
    pub fn from_integrity_rule(rule: &IntegrityRule) -> Self {
        let constraint_type = match rule.rule_type.to_lowercase().as_str() {
            "not_null" | "notnull" => ConstraintType::NotNull,
            "foreign_key" | "foreignkey" | "fk" => ConstraintType::ForeignKey,
            "unique" => ConstraintType::Unique,
            "check" => ConstraintType::Check,
            _ => ConstraintType::BusinessRule,
        };
        Self {
            constraint_type,
            table: rule.table.clone(),
            columns: Vec::new(),
            expression: Some(rule.condition.clone()),
            referenced_table: None,
            name: rule.name.clone(),
        }
    }
}

/// One field-level correction applied by a handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedFix {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Value>,
    pub value: Value,
    pub reason: String,
    pub confidence: f64,
}

/// Outcome of running one constraint against one candidate row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintHandlingResult {
    pub success: bool,
    pub original_row: Row,
    pub modified_row: Row,
    pub applied_fixes: Vec<AppliedFix>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    /// Set when no handler could resolve the constraint: the caller must
    /// drop the row or accept the violation risk.
    pub bypass_required: bool,
}

impl ConstraintHandlingResult {
    /// A passing result that leaves the row untouched.
    pub fn unchanged(row: &Row) -> Self {
        Self {
            success: true,
            original_row: row.clone(),
            modified_row: row.clone(),
            applied_fixes: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            bypass_required: false,
        }
    }

    /// An unresolved result: the registry found no way to satisfy the
    /// constraint.
    pub fn bypass(row: &Row, warning: impl Into<String>) -> Self {
        Self {
            success: false,
            original_row: row.clone(),
            modified_row: row.clone(),
            applied_fixes: Vec::new(),
            warnings: vec![warning.into()],
            errors: Vec::new(),
            bypass_required: true,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    /// Apply one fix to the modified row, recording before/after.
    pub fn apply_fix(
        &mut self,
        field: &str,
        value: Value,
        reason: impl Into<String>,
        confidence: f64,
    ) {
        let previous = self.modified_row.get(field).cloned();
        self.modified_row.insert(field.to_string(), value.clone());
        self.applied_fixes.push(AppliedFix {
            field: field.to_string(),
            previous,
            value,
            reason: reason.into(),
            confidence,
        });
    }
}
