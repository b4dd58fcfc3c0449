//! Rule extraction from trigger/function bodies.
//!
//! This is deliberately not a SQL parser. Function text is normalized into
//! a flat token stream, then matched against a small grammar of recognized
//! PL/pgSQL idioms. "No match" is a normal outcome: unrecognized statements
//! produce zero rules and never abort discovery. Each idiom carries a fixed
//! confidence; exception-guarded idioms score above bare conditionals
//! because the intent of the rule is explicit in the exception.

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::model::{
    AutoFixKind, AutoFixSuggestion, BusinessRule, FunctionDescriptor, RuleAction, RuleType,
};

/// Confidence for `IF NOT EXISTS (...) THEN RAISE EXCEPTION` extractions.
const CONFIDENCE_NOT_EXISTS_EXCEPTION: f64 = 0.85;
/// Confidence for `IF EXISTS (...) THEN RAISE EXCEPTION` extractions.
const CONFIDENCE_EXISTS_EXCEPTION: f64 = 0.8;
/// Confidence for `NEW.col := expr` assignment extractions.
const CONFIDENCE_ASSIGNMENT: f64 = 0.75;
/// Confidence for a bare `IF cond THEN RAISE EXCEPTION` guard.
const CONFIDENCE_GUARDED_EXCEPTION: f64 = 0.7;
/// Confidence for a conditional `SELECT ... FROM t WHERE col = val`.
const CONFIDENCE_CONDITIONAL_SELECT: f64 = 0.6;

/// Extract every recognizable rule from one function body, attributed to
/// the trigger's table.
pub fn extract_rules(function: &FunctionDescriptor, table: &str) -> Vec<BusinessRule> {
    let body = normalize_body(&function.definition);
    let table = table.to_lowercase();
    let mut rules = Vec::new();
    let mut claimed: Vec<(usize, usize)> = Vec::new();

    extract_not_exists_exceptions(&body, &table, function, &mut rules, &mut claimed);
    extract_exists_exceptions(&body, &table, function, &mut rules, &mut claimed);
    extract_guarded_exceptions(&body, &table, function, &mut rules, &mut claimed);
    extract_conditional_selects(&body, &table, function, &mut rules, &mut claimed);
    extract_assignments(&body, &table, function, &mut rules, &mut claimed);

    if rules.is_empty() {
        debug!(
            function = %function.name,
            table = %table,
            "no recognized idioms in function body"
        );
    }

    rules
}

/// Collapse whitespace so the idiom patterns see one flat statement
/// stream regardless of the original formatting.
fn normalize_body(definition: &str) -> String {
    definition.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern).ok()
}

fn overlaps(claimed: &[(usize, usize)], start: usize, end: usize) -> bool {
    claimed
        .iter()
        .any(|(claimed_start, claimed_end)| start < *claimed_end && end > *claimed_start)
}

fn extract_not_exists_exceptions(
    body: &str,
    table: &str,
    function: &FunctionDescriptor,
    rules: &mut Vec<BusinessRule>,
    claimed: &mut Vec<(usize, usize)>,
) {
    let Some(re) = compile(
        r"(?i)IF\s+NOT\s+EXISTS\s*\(\s*SELECT\s+.+?\s+FROM\s+(\w+)\s+WHERE\s+(\w+)\s*=\s*([^)\s]+)\s*\)\s*THEN\s+RAISE\s+EXCEPTION\s+'([^']*)'",
    ) else {
        return;
    };

    for caps in re.captures_iter(body) {
        let Some(span) = caps.get(0) else {
            continue;
        };
        if overlaps(claimed, span.start(), span.end()) {
            continue;
        }
        claimed.push((span.start(), span.end()));

        let referenced = caps[1].to_lowercase();
        let column = caps[2].to_lowercase();
        let value_text = caps[3].trim().to_string();
        let message = caps[4].to_string();

        rules.push(build_rule(
            function,
            table,
            RuleType::Validation,
            RuleAction::Deny,
            format!("{column} = {value_text}"),
            Some(message),
            Some(AutoFixSuggestion {
                kind: AutoFixKind::SetField,
                field: Some(column),
                value: Some(parse_literal(&value_text)),
                target_table: None,
                confidence: CONFIDENCE_NOT_EXISTS_EXCEPTION,
            }),
            CONFIDENCE_NOT_EXISTS_EXCEPTION,
            span.as_str().to_string(),
            vec![referenced],
            rules.len(),
        ));
    }
}

fn extract_exists_exceptions(
    body: &str,
    table: &str,
    function: &FunctionDescriptor,
    rules: &mut Vec<BusinessRule>,
    claimed: &mut Vec<(usize, usize)>,
) {
    let Some(re) = compile(
        r"(?i)IF\s+EXISTS\s*\(\s*SELECT\s+.+?\s+FROM\s+(\w+)\s+WHERE\s+(\w+)\s*=\s*([^)\s]+)\s*\)\s*THEN\s+RAISE\s+EXCEPTION\s+'([^']*)'",
    ) else {
        return;
    };

    for caps in re.captures_iter(body) {
        let Some(span) = caps.get(0) else {
            continue;
        };
        if overlaps(claimed, span.start(), span.end()) {
            continue;
        }
        claimed.push((span.start(), span.end()));

        let referenced = caps[1].to_lowercase();
        let column = caps[2].to_lowercase();
        let value_text = caps[3].trim().to_string();
        let message = caps[4].to_string();

        rules.push(build_rule(
            function,
            table,
            RuleType::Validation,
            RuleAction::Deny,
            format!("not ({column} = {value_text})"),
            Some(message),
            Some(AutoFixSuggestion {
                kind: AutoFixKind::SkipOperation,
                field: None,
                value: None,
                target_table: None,
                confidence: CONFIDENCE_EXISTS_EXCEPTION,
            }),
            CONFIDENCE_EXISTS_EXCEPTION,
            span.as_str().to_string(),
            vec![referenced],
            rules.len(),
        ));
    }
}

fn extract_guarded_exceptions(
    body: &str,
    table: &str,
    function: &FunctionDescriptor,
    rules: &mut Vec<BusinessRule>,
    claimed: &mut Vec<(usize, usize)>,
) {
    let Some(re) = compile(r"(?i)IF\s+([^;]{1,160}?)\s+THEN\s+RAISE\s+EXCEPTION\s+'([^']*)'")
    else {
        return;
    };

    for caps in re.captures_iter(body) {
        let Some(span) = caps.get(0) else {
            continue;
        };
        if overlaps(claimed, span.start(), span.end()) {
            continue;
        }
        claimed.push((span.start(), span.end()));

        let condition = caps[1].trim().to_string();
        let message = caps[2].to_string();

        rules.push(build_rule(
            function,
            table,
            RuleType::Validation,
            RuleAction::Deny,
            condition,
            Some(message),
            None,
            CONFIDENCE_GUARDED_EXCEPTION,
            span.as_str().to_string(),
            Vec::new(),
            rules.len(),
        ));
    }
}

fn extract_conditional_selects(
    body: &str,
    table: &str,
    function: &FunctionDescriptor,
    rules: &mut Vec<BusinessRule>,
    claimed: &mut Vec<(usize, usize)>,
) {
    let Some(re) = compile(
        r"(?i)(?:IF|ELSIF|WHEN)\s[^;]{0,160}?SELECT\s+.+?\s+FROM\s+(\w+)\s+WHERE\s+(\w+)\s*=\s*([^)\s;]+)",
    ) else {
        return;
    };

    for caps in re.captures_iter(body) {
        let Some(span) = caps.get(0) else {
            continue;
        };
        if overlaps(claimed, span.start(), span.end()) {
            continue;
        }
        claimed.push((span.start(), span.end()));

        let referenced = caps[1].to_lowercase();
        let column = caps[2].to_lowercase();
        let value_text = caps[3].trim().to_string();

        rules.push(build_rule(
            function,
            table,
            RuleType::Dependency,
            RuleAction::Require,
            format!("{column} = {value_text}"),
            None,
            Some(AutoFixSuggestion {
                kind: AutoFixKind::CreateDependency,
                field: Some(column),
                value: Some(parse_literal(&value_text)),
                target_table: Some(referenced.clone()),
                confidence: CONFIDENCE_CONDITIONAL_SELECT,
            }),
            CONFIDENCE_CONDITIONAL_SELECT,
            span.as_str().to_string(),
            vec![referenced],
            rules.len(),
        ));
    }
}

fn extract_assignments(
    body: &str,
    table: &str,
    function: &FunctionDescriptor,
    rules: &mut Vec<BusinessRule>,
    claimed: &mut Vec<(usize, usize)>,
) {
    let Some(re) = compile(r"(?i)NEW\.(\w+)\s*:=\s*([^;]+);") else {
        return;
    };

    for caps in re.captures_iter(body) {
        let Some(span) = caps.get(0) else {
            continue;
        };
        if overlaps(claimed, span.start(), span.end()) {
            continue;
        }
        claimed.push((span.start(), span.end()));

        let column = caps[1].to_lowercase();
        let value_text = caps[2].trim().to_string();

        rules.push(build_rule(
            function,
            table,
            RuleType::Transformation,
            RuleAction::Modify,
            format!("{column} := {value_text}"),
            None,
            Some(AutoFixSuggestion {
                kind: AutoFixKind::SetField,
                field: Some(column),
                value: Some(parse_literal(&value_text)),
                target_table: None,
                confidence: CONFIDENCE_ASSIGNMENT,
            }),
            CONFIDENCE_ASSIGNMENT,
            span.as_str().to_string(),
            Vec::new(),
            rules.len(),
        ));
    }
}

#[allow(clippy::too_many_arguments)]
fn build_rule(
    function: &FunctionDescriptor,
    table: &str,
    rule_type: RuleType,
    action: RuleAction,
    condition: String,
    error_message: Option<String>,
    auto_fix: Option<AutoFixSuggestion>,
    confidence: f64,
    source_pattern: String,
    dependencies: Vec<String>,
    ordinal: usize,
) -> BusinessRule {
    let dependencies: Vec<String> = dependencies
        .into_iter()
        .filter(|dep| dep != table)
        .collect();

    let name = error_message
        .as_deref()
        .map(slugify)
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| format!("{}_{ordinal}", function.name));

    BusinessRule {
        id: BusinessRule::deterministic_id(&function.name, table, ordinal),
        name,
        rule_type,
        table: table.to_string(),
        condition,
        action,
        error_message,
        auto_fix,
        confidence,
        source_pattern,
        dependencies,
    }
}

fn slugify(text: &str) -> String {
    let mut slug: String = text
        .to_lowercase()
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
        .collect();
    while slug.contains("__") {
        slug = slug.replace("__", "_");
    }
    slug.trim_matches('_').chars().take(48).collect()
}

/// Parse a SQL-ish literal into a JSON value, stripping casts and quotes.
fn parse_literal(text: &str) -> Value {
    let trimmed = text.trim();
    let without_cast = match trimmed.split_once("::") {
        Some((left, _)) => left.trim(),
        None => trimmed,
    };

    if without_cast.len() >= 2 && without_cast.starts_with('\'') && without_cast.ends_with('\'') {
        return Value::String(without_cast[1..without_cast.len() - 1].to_string());
    }
    if without_cast.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if without_cast.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if without_cast.eq_ignore_ascii_case("null") {
        return Value::Null;
    }
    if let Ok(int) = without_cast.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(float) = without_cast.parse::<f64>()
        && let Some(number) = serde_json::Number::from_f64(float)
    {
        return Value::Number(number);
    }
    Value::String(without_cast.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn function(name: &str, definition: &str) -> FunctionDescriptor {
        FunctionDescriptor {
            name: name.to_string(),
            definition: definition.to_string(),
        }
    }

    #[test]
    fn not_exists_exception_yields_deny_rule_with_fix() {
        let body = r"
            BEGIN
                IF NOT EXISTS (SELECT 1 FROM accounts WHERE is_personal_account = true) THEN
                    RAISE EXCEPTION 'no personal account';
                END IF;
                RETURN NEW;
            END;
        ";
        let rules = extract_rules(&function("check_personal_account", body), "accounts");

        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.rule_type, RuleType::Validation);
        assert_eq!(rule.action, RuleAction::Deny);
        assert_eq!(rule.table, "accounts");
        // Self-dependency excluded.
        assert!(rule.dependencies.is_empty());
        assert_eq!(rule.error_message.as_deref(), Some("no personal account"));
        let fix = rule.auto_fix.as_ref().unwrap();
        assert_eq!(fix.kind, AutoFixKind::SetField);
        assert_eq!(fix.field.as_deref(), Some("is_personal_account"));
        assert_eq!(fix.value, Some(Value::Bool(true)));
    }

    #[test]
    fn cross_table_reference_becomes_dependency() {
        let body = r"
            BEGIN
                IF NOT EXISTS (SELECT 1 FROM subscriptions WHERE status = 'active') THEN
                    RAISE EXCEPTION 'subscription required';
                END IF;
                RETURN NEW;
            END;
        ";
        let rules = extract_rules(&function("check_subscription", body), "projects");
        assert_eq!(rules[0].dependencies, vec!["subscriptions".to_string()]);
    }

    #[test]
    fn exception_patterns_outrank_bare_conditionals() {
        let exception_body =
            "IF NOT EXISTS (SELECT 1 FROM plans WHERE tier = 'pro') THEN RAISE EXCEPTION 'plan missing'; END IF;";
        let conditional_body =
            "IF (SELECT count(*) FROM plans WHERE tier = 'pro') > 0 THEN RETURN NEW; END IF;";

        let exception = extract_rules(&function("f1", exception_body), "projects");
        let conditional = extract_rules(&function("f2", conditional_body), "projects");

        assert!(exception[0].confidence > conditional[0].confidence);
        assert_eq!(conditional[0].rule_type, RuleType::Dependency);
        assert_eq!(conditional[0].action, RuleAction::Require);
    }

    #[test]
    fn assignment_yields_transformation_rule() {
        let body = "BEGIN NEW.updated_at := now(); RETURN NEW; END;";
        let rules = extract_rules(&function("touch_updated_at", body), "posts");

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].rule_type, RuleType::Transformation);
        assert_eq!(rules[0].action, RuleAction::Modify);
        let fix = rules[0].auto_fix.as_ref().unwrap();
        assert_eq!(fix.field.as_deref(), Some("updated_at"));
    }

    #[test]
    fn guarded_exception_without_exists_still_extracts() {
        let body = "IF NEW.amount < 0 THEN RAISE EXCEPTION 'negative amount'; END IF;";
        let rules = extract_rules(&function("check_amount", body), "payments");

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].condition, "NEW.amount < 0");
        assert!(rules[0].auto_fix.is_none());
        assert!((rules[0].confidence - CONFIDENCE_GUARDED_EXCEPTION).abs() < 1e-9);
    }

    #[test]
    fn unmatched_body_yields_no_rules() {
        let body = "BEGIN PERFORM pg_notify('events', 'row'); RETURN NEW; END;";
        assert!(extract_rules(&function("notify", body), "events").is_empty());
    }

    #[test]
    fn extraction_is_deterministic() {
        let body =
            "IF NOT EXISTS (SELECT 1 FROM accounts WHERE active = true) THEN RAISE EXCEPTION 'inactive'; END IF; NEW.updated_at := now();";
        let first = extract_rules(&function("f", body), "orders");
        let second = extract_rules(&function("f", body), "orders");
        let first_json = serde_json::to_string(&first).unwrap();
        let second_json = serde_json::to_string(&second).unwrap();
        assert_eq!(first_json, second_json);
    }

    #[test]
    fn literals_parse_with_casts_stripped() {
        assert_eq!(parse_literal("'acme'::text"), Value::String("acme".to_string()));
        assert_eq!(parse_literal("true"), Value::Bool(true));
        assert_eq!(parse_literal("42"), Value::Number(42.into()));
        assert_eq!(parse_literal("NULL"), Value::Null);
    }
}
