//! Built-in handlers for common ownership/slug/role/billing idioms.
//!
//! These encode business rules seen across team-account scaffolds as
//! pattern-specific handlers. They complement the discovery engine: rules
//! here are hard-coded, not derived from trigger text.

use serde_json::Value;

use crate::handler::ConstraintHandler;
use crate::model::{ConstraintDescriptor, ConstraintHandlingResult, ConstraintType, Row};

/// Confidence attached to the built-in idiom fixes.
const IDIOM_FIX_CONFIDENCE: f64 = 0.95;

fn as_bool(row: &Row, field: &str) -> Option<bool> {
    row.get(field).and_then(Value::as_bool)
}

fn as_str<'a>(row: &'a Row, field: &str) -> Option<&'a str> {
    row.get(field).and_then(Value::as_str)
}

/// Personal accounts must have a null slug.
pub struct PersonalAccountSlugHandler;

impl ConstraintHandler for PersonalAccountSlugHandler {
    fn id(&self) -> &'static str {
        "personal_account_slug"
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::BusinessRule
    }

    fn priority(&self) -> u32 {
        100
    }

    fn can_handle(&self, _constraint: &ConstraintDescriptor, row: &Row) -> bool {
        as_bool(row, "is_personal_account") == Some(true)
            && row.get("slug").map(|slug| !slug.is_null()).unwrap_or(false)
    }

    fn handle(&self, _constraint: &ConstraintDescriptor, row: &Row) -> ConstraintHandlingResult {
        let mut result = ConstraintHandlingResult::unchanged(row);
        result.apply_fix(
            "slug",
            Value::Null,
            "personal accounts must have a null slug",
            IDIOM_FIX_CONFIDENCE,
        );
        result
    }
}

/// Rows carrying the owner role must also carry the owner flag.
pub struct OwnerRoleFlagHandler;

impl ConstraintHandler for OwnerRoleFlagHandler {
    fn id(&self) -> &'static str {
        "owner_role_flag"
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::BusinessRule
    }

    fn priority(&self) -> u32 {
        90
    }

    fn can_handle(&self, _constraint: &ConstraintDescriptor, row: &Row) -> bool {
        as_str(row, "role") == Some("owner")
            && row.contains_key("is_owner")
            && as_bool(row, "is_owner") != Some(true)
    }

    fn handle(&self, _constraint: &ConstraintDescriptor, row: &Row) -> ConstraintHandlingResult {
        let mut result = ConstraintHandlingResult::unchanged(row);
        result.apply_fix(
            "is_owner",
            Value::Bool(true),
            "owner role requires the owner flag",
            IDIOM_FIX_CONFIDENCE,
        );
        result
    }
}

/// `account_type` must agree with the personal/team boolean.
pub struct AccountTypeConsistencyHandler;

impl ConstraintHandler for AccountTypeConsistencyHandler {
    fn id(&self) -> &'static str {
        "account_type_consistency"
    }

    fn constraint_type(&self) -> ConstraintType {
        ConstraintType::BusinessRule
    }

    fn priority(&self) -> u32 {
        80
    }

    fn can_handle(&self, _constraint: &ConstraintDescriptor, row: &Row) -> bool {
        let Some(account_type) = as_str(row, "account_type") else {
            return false;
        };
        let Some(is_personal) = as_bool(row, "is_personal_account") else {
            return false;
        };
        matches!(
            (account_type, is_personal),
            ("personal", false) | ("team", true)
        )
    }

    fn handle(&self, _constraint: &ConstraintDescriptor, row: &Row) -> ConstraintHandlingResult {
        let mut result = ConstraintHandlingResult::unchanged(row);
        let expected = as_str(row, "account_type") == Some("personal");
        result.apply_fix(
            "is_personal_account",
            Value::Bool(expected),
            "account type must agree with the personal/team boolean",
            IDIOM_FIX_CONFIDENCE,
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn constraint() -> ConstraintDescriptor {
        ConstraintDescriptor {
            constraint_type: ConstraintType::BusinessRule,
            table: "accounts".to_string(),
            columns: Vec::new(),
            expression: None,
            referenced_table: None,
            name: "accounts_business_rules".to_string(),
        }
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn personal_account_slug_is_nulled() {
        let handler = PersonalAccountSlugHandler;
        let row = row(&[
            ("is_personal_account", json!(true)),
            ("slug", json!("acme")),
        ]);

        assert!(handler.can_handle(&constraint(), &row));
        let result = handler.handle(&constraint(), &row);

        assert!(result.success);
        assert_eq!(result.modified_row.get("slug"), Some(&Value::Null));
        assert_eq!(result.applied_fixes.len(), 1);
        assert!(result.applied_fixes[0].confidence >= 0.9);
        // The original row is preserved for auditing.
        assert_eq!(result.original_row.get("slug"), Some(&json!("acme")));
    }

    #[test]
    fn team_account_slug_is_left_alone() {
        let handler = PersonalAccountSlugHandler;
        let row = row(&[
            ("is_personal_account", json!(false)),
            ("slug", json!("acme")),
        ]);
        assert!(!handler.can_handle(&constraint(), &row));
    }

    #[test]
    fn owner_role_sets_owner_flag() {
        let handler = OwnerRoleFlagHandler;
        let row = row(&[("role", json!("owner")), ("is_owner", json!(false))]);

        assert!(handler.can_handle(&constraint(), &row));
        let result = handler.handle(&constraint(), &row);
        assert_eq!(result.modified_row.get("is_owner"), Some(&json!(true)));
    }

    #[test]
    fn account_type_disagreement_is_corrected() {
        let handler = AccountTypeConsistencyHandler;
        let row = row(&[
            ("account_type", json!("personal")),
            ("is_personal_account", json!(false)),
        ]);

        assert!(handler.can_handle(&constraint(), &row));
        let result = handler.handle(&constraint(), &row);
        assert_eq!(
            result.modified_row.get("is_personal_account"),
            Some(&json!(true))
        );
    }

    #[test]
    fn consistent_account_type_does_not_match() {
        let handler = AccountTypeConsistencyHandler;
        let row = row(&[
            ("account_type", json!("team")),
            ("is_personal_account", json!(false)),
        ]);
        assert!(!handler.can_handle(&constraint(), &row));
    }
}
