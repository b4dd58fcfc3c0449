use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Raw trigger metadata from the system catalogs.
///
/// Both the detailed and the fallback catalog query produce this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerDescriptor {
    pub name: String,
    pub table: String,
    /// `BEFORE`, `AFTER`, or `INSTEAD OF`.
    pub timing: String,
    /// Firing events, e.g. `INSERT`, `UPDATE`.
    pub events: Vec<String>,
    pub function_name: String,
    /// Full trigger definition when the catalog exposes it.
    pub definition: Option<String>,
}

/// Raw function metadata. Cached by name since many triggers commonly
/// share one function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub definition: String,
}

/// What kind of behavior a business rule encodes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Validation,
    Transformation,
    Dependency,
    BusinessLogic,
}

/// What the rule does to a candidate operation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Allow,
    Deny,
    Modify,
    Require,
}

/// Kind of correction an auto-fix suggests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AutoFixKind {
    SetField,
    CreateDependency,
    SkipOperation,
    ModifyWorkflow,
}

/// A suggested field-level correction that would make a candidate row
/// satisfy a discovered rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoFixSuggestion {
    pub kind: AutoFixKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_table: Option<String>,
    pub confidence: f64,
}

/// A structured business rule extracted from trigger/function text.
///
/// Immutable once extracted. Pattern matches are not proofs: `confidence`
/// reflects how reliable the source idiom is, and `source_pattern` keeps
/// the raw matched text for auditing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRule {
    pub id: Uuid,
    pub name: String,
    pub rule_type: RuleType,
    pub table: String,
    /// Textual predicate, e.g. `is_personal_account = true`.
    pub condition: String,
    pub action: RuleAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_fix: Option<AutoFixSuggestion>,
    pub confidence: f64,
    pub source_pattern: String,
    /// Tables this rule depends on; never contains the rule's own table.
    pub dependencies: Vec<String>,
}

/// How strongly one table requires another.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    Required,
    Optional,
    Conditional,
}

/// A directed "from needs to" table dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDependency {
    pub from_table: String,
    pub to_table: String,
    pub relationship: DependencyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub constraint_name: String,
}

impl BusinessRule {
    /// Deterministic id so discovery over unchanged text yields an
    /// identical rule set.
    pub fn deterministic_id(function: &str, table: &str, ordinal: usize) -> Uuid {
        let key = format!("seedwright:{function}:{table}:{ordinal}");
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
    }
}
