//! Best-effort generic handlers, one per constraint type.
//!
//! These run when no specific handler matches. They recognize a few raw
//! constraint shapes with regexes and attach warnings rather than failing;
//! anything they cannot resolve sets `bypass_required` so the caller can
//! decide what to do with the row.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::handler::ConstraintHandler;
use crate::model::{ConstraintDescriptor, ConstraintHandlingResult, ConstraintType, Row};

/// Confidence attached to heuristic generic fixes.
const GENERIC_FIX_CONFIDENCE: f64 = 0.6;
/// Confidence attached to length truncation, which is shape-preserving.
const TRUNCATE_FIX_CONFIDENCE: f64 = 0.7;

/// NOT NULL: pass when every constrained field is present and non-null.
pub struct GenericNotNullHandler;

impl ConstraintHandler for GenericNotNullHandler {
    fn id(&self) -> &'static str {
        "generic_not_null"
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::NotNull
    }

    fn priority(&self) -> u32 {
        0
    }

    fn can_handle(&self, _constraint: &ConstraintDescriptor, _row: &Row) -> bool {
        true
    }

    fn handle(&self, constraint: &ConstraintDescriptor, row: &Row) -> ConstraintHandlingResult {
        let mut result = ConstraintHandlingResult::unchanged(row);
        for column in &constraint.columns {
            let present = row.get(column).map(|value| !value.is_null()).unwrap_or(false);
            if !present {
                result.success = false;
                result.bypass_required = true;
                result.warnings.push(format!(
                    "not-null column '{}' is missing from the candidate row",
                    column
                ));
            }
        }
        result
    }
}

/// Foreign keys: the registry cannot see parent data, so it only notes the
/// existence requirement for the caller.
pub struct GenericForeignKeyHandler;

impl ConstraintHandler for GenericForeignKeyHandler {
    fn id(&self) -> &'static str {
        "generic_foreign_key"
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::ForeignKey
    }

    fn priority(&self) -> u32 {
        0
    }

    fn can_handle(&self, _constraint: &ConstraintDescriptor, _row: &Row) -> bool {
        true
    }

    fn handle(&self, constraint: &ConstraintDescriptor, row: &Row) -> ConstraintHandlingResult {
        let parent = constraint
            .referenced_table
            .as_deref()
            .unwrap_or("the parent table");
        ConstraintHandlingResult::unchanged(row).with_warning(format!(
            "columns {:?} must reference an existing row in {parent}",
            constraint.columns
        ))
    }
}

/// Uniqueness: note the duplicate-sensitive column shape for the caller.
pub struct GenericUniqueHandler;

impl ConstraintHandler for GenericUniqueHandler {
    fn id(&self) -> &'static str {
        "generic_unique"
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Unique
    }

    fn priority(&self) -> u32 {
        0
    }

    fn can_handle(&self, _constraint: &ConstraintDescriptor, _row: &Row) -> bool {
        true
    }

    fn handle(&self, constraint: &ConstraintDescriptor, row: &Row) -> ConstraintHandlingResult {
        ConstraintHandlingResult::unchanged(row).with_warning(format!(
            "columns {:?} must be unique across generated rows",
            constraint.columns
        ))
    }
}

/// CHECK: recognize NOT NULL, length, and enum-`IN (...)` shapes inside the
/// raw clause; anything else is bypassed.
pub struct GenericCheckHandler;

impl ConstraintHandler for GenericCheckHandler {
    fn id(&self) -> &'static str {
        "generic_check"
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Check
    }

    fn priority(&self) -> u32 {
        0
    }

    fn can_handle(&self, _constraint: &ConstraintDescriptor, _row: &Row) -> bool {
        true
    }

    fn handle(&self, constraint: &ConstraintDescriptor, row: &Row) -> ConstraintHandlingResult {
        let Some(expression) = constraint.expression.as_deref() else {
            return ConstraintHandlingResult::bypass(
                row,
                format!("check constraint '{}' has no expression text", constraint.name),
            );
        };
        let expression = normalize_expression(expression);
        let expression = expression.as_str();

        if let Some(column) = parse_not_null(expression) {
            let mut result = ConstraintHandlingResult::unchanged(row);
            let present = row.get(&column).map(|value| !value.is_null()).unwrap_or(false);
            if !present {
                result.success = false;
                result.bypass_required = true;
                result
                    .warnings
                    .push(format!("check requires '{column}' to be non-null"));
            }
            return result;
        }

        if let Some((column, op, limit)) = parse_length_check(expression) {
            return handle_length_check(row, &column, &op, limit);
        }

        if let Some((column, allowed)) = parse_in_list(expression) {
            return handle_in_list(row, &column, &allowed);
        }

        debug!(
            constraint = %constraint.name,
            "unrecognized check expression, bypassing"
        );
        ConstraintHandlingResult::bypass(
            row,
            format!("check constraint '{}' is not a recognized shape", constraint.name),
        )
    }
}

/// Business rules with no specific handler cannot be resolved generically.
pub struct GenericBusinessRuleHandler;

impl ConstraintHandler for GenericBusinessRuleHandler {
    fn id(&self) -> &'static str {
        "generic_business_rule"
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::BusinessRule
    }

    fn priority(&self) -> u32 {
        0
    }

    fn can_handle(&self, _constraint: &ConstraintDescriptor, _row: &Row) -> bool {
        true
    }

    fn handle(&self, constraint: &ConstraintDescriptor, row: &Row) -> ConstraintHandlingResult {
        ConstraintHandlingResult::bypass(
            row,
            format!(
                "business rule '{}' has no specific handler registered",
                constraint.name
            ),
        )
    }
}

fn handle_length_check(
    row: &Row,
    column: &str,
    op: &str,
    limit: usize,
) -> ConstraintHandlingResult {
    let mut result = ConstraintHandlingResult::unchanged(row);
    let Some(text) = row.get(column).and_then(Value::as_str) else {
        return result;
    };

    match op {
        "<=" | "<" => {
            let max = if op == "<" { limit.saturating_sub(1) } else { limit };
            if text.chars().count() > max {
                let truncated: String = text.chars().take(max).collect();
                result.apply_fix(
                    column,
                    Value::String(truncated),
                    format!("value exceeded the {max}-character limit"),
                    TRUNCATE_FIX_CONFIDENCE,
                );
                result
                    .warnings
                    .push(format!("'{column}' was truncated to satisfy a length check"));
            }
        }
        ">=" | ">" => {
            let min = if op == ">" { limit + 1 } else { limit };
            if text.chars().count() < min {
                result.success = false;
                result.bypass_required = true;
                result.warnings.push(format!(
                    "'{column}' is shorter than the {min}-character minimum"
                ));
            }
        }
        _ => {}
    }
    result
}

fn handle_in_list(row: &Row, column: &str, allowed: &[String]) -> ConstraintHandlingResult {
    let mut result = ConstraintHandlingResult::unchanged(row);
    let Some(value) = row.get(column).and_then(Value::as_str) else {
        return result;
    };

    if !allowed.iter().any(|candidate| candidate == value) {
        let Some(replacement) = allowed.first() else {
            return ConstraintHandlingResult::bypass(
                row,
                format!("'{column}' has an empty allowed-value list"),
            );
        };
        result.apply_fix(
            column,
            Value::String(replacement.clone()),
            format!("'{value}' is not in the allowed set"),
            GENERIC_FIX_CONFIDENCE,
        );
        result
            .warnings
            .push(format!("'{column}' was replaced with an allowed value"));
    }
    result
}

/// Strip the `CHECK` keyword and balanced outer parentheses.
fn normalize_expression(expression: &str) -> String {
    let mut expr = expression.trim().to_string();
    if expr.to_uppercase().starts_with("CHECK") {
        expr = expr[5..].trim().to_string();
    }
    while expr.starts_with('(') && expr.ends_with(')') {
        expr = expr[1..expr.len() - 1].trim().to_string();
    }
    expr
}

fn parse_not_null(expression: &str) -> Option<String> {
    let re = Regex::new(r"(?i)^\s*\(?\s*(\w+)\s+IS\s+NOT\s+NULL\s*\)?\s*$").ok()?;
    let caps = re.captures(expression)?;
    Some(caps[1].to_lowercase())
}

fn parse_length_check(expression: &str) -> Option<(String, String, usize)> {
    let re = Regex::new(
        r"(?i)(?:char_length|character_length|length)\s*\(\s*\(?\s*(\w+)\s*\)?(?:::text)?\s*\)\s*(<=|<|>=|>)\s*(\d+)",
    )
    .ok()?;
    let caps = re.captures(expression)?;
    let limit = caps[3].parse::<usize>().ok()?;
    Some((caps[1].to_lowercase(), caps[2].to_string(), limit))
}

fn parse_in_list(expression: &str) -> Option<(String, Vec<String>)> {
    let in_re = Regex::new(r"(?i)(\w+)(?:::text)?\s+IN\s*\(([^)]+)\)").ok()?;
    let any_re = Regex::new(r"(?i)(\w+)(?:::text)?\s*=\s*ANY\s*\(\s*ARRAY\[([^\]]+)\]")
        .ok()?;

    let caps = in_re
        .captures(expression)
        .or_else(|| any_re.captures(expression))?;
    let values = caps[2]
        .split(',')
        .map(normalize_literal)
        .filter(|value| !value.is_empty())
        .collect();
    Some((caps[1].to_lowercase(), values))
}

fn normalize_literal(value: &str) -> String {
    let trimmed = value.trim();
    let without_cast = match trimmed.split_once("::") {
        Some((left, _)) => left.trim(),
        None => trimmed,
    };
    if without_cast.len() >= 2 && without_cast.starts_with('\'') && without_cast.ends_with('\'') {
        without_cast[1..without_cast.len() - 1].to_string()
    } else {
        without_cast.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check_constraint(expression: &str) -> ConstraintDescriptor {
        ConstraintDescriptor {
            constraint_type: ConstraintType::Check,
            table: "accounts".to_string(),
            columns: Vec::new(),
            expression: Some(expression.to_string()),
            referenced_table: None,
            name: "accounts_check".to_string(),
        }
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn satisfiable_not_null_never_errors() {
        let handler = GenericNotNullHandler;
        let constraint = ConstraintDescriptor {
            constraint_type: ConstraintType::NotNull,
            table: "users".to_string(),
            columns: vec!["email".to_string()],
            expression: None,
            referenced_table: None,
            name: "users_email_not_null".to_string(),
        };
        let result = handler.handle(&constraint, &row(&[("email", json!("a@example.com"))]));

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert!(!result.bypass_required);
    }

    #[test]
    fn missing_not_null_column_requires_bypass() {
        let handler = GenericNotNullHandler;
        let constraint = ConstraintDescriptor {
            constraint_type: ConstraintType::NotNull,
            table: "users".to_string(),
            columns: vec!["email".to_string()],
            expression: None,
            referenced_table: None,
            name: "users_email_not_null".to_string(),
        };
        let result = handler.handle(&constraint, &row(&[]));

        assert!(!result.success);
        assert!(result.bypass_required);
    }

    #[test]
    fn check_not_null_shape_is_recognized() {
        let handler = GenericCheckHandler;
        let constraint = check_constraint("CHECK ((email IS NOT NULL))");

        let present = handler.handle(&constraint, &row(&[("email", json!("a@example.com"))]));
        assert!(present.success && !present.bypass_required);

        let missing = handler.handle(&constraint, &row(&[]));
        assert!(missing.bypass_required);
    }

    #[test]
    fn check_in_list_replaces_disallowed_value() {
        let handler = GenericCheckHandler;
        let constraint =
            check_constraint("CHECK (status IN ('draft', 'published', 'archived'))");
        let result = handler.handle(&constraint, &row(&[("status", json!("bogus"))]));

        assert_eq!(result.modified_row.get("status"), Some(&json!("draft")));
        assert_eq!(result.applied_fixes.len(), 1);
    }

    #[test]
    fn check_any_array_shape_is_recognized() {
        let handler = GenericCheckHandler;
        let constraint = check_constraint(
            "CHECK ((tier = ANY (ARRAY['free'::text, 'pro'::text, 'enterprise'::text])))",
        );
        let result = handler.handle(&constraint, &row(&[("tier", json!("pro"))]));

        assert!(result.success);
        assert!(result.applied_fixes.is_empty());
    }

    #[test]
    fn check_length_truncates_long_values() {
        let handler = GenericCheckHandler;
        let constraint = check_constraint("CHECK (char_length(name) <= 5)");
        let result = handler.handle(&constraint, &row(&[("name", json!("overlong"))]));

        assert_eq!(result.modified_row.get("name"), Some(&json!("overl")));
        assert!(!result.bypass_required);
    }

    #[test]
    fn unrecognized_check_is_bypassed() {
        let handler = GenericCheckHandler;
        let constraint = check_constraint("CHECK (price > cost * 1.2)");
        let result = handler.handle(&constraint, &row(&[("price", json!(10))]));

        assert!(result.bypass_required);
        assert!(!result.warnings.is_empty());
    }
}
