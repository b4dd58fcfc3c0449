//! Constraint discovery engine.
//!
//! One run walks a fixed pipeline: discover triggers for the requested
//! tables, load each distinct function body (name-keyed cache), extract
//! rules from the bodies, aggregate per-table constraint sets plus a flat
//! dependency list, and build the creation-order graph. Partial extraction
//! is the expected steady state: unreadable functions and unmatched bodies
//! degrade the result, they never abort it.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use seedwright_core::{Result, SchemaSnapshot, TtlCache, scoring};

use crate::catalog::TriggerCatalog;
use crate::extract::extract_rules;
use crate::graph::{DependencyGraph, build_graph};
use crate::model::{
    BusinessRule, DependencyKind, FunctionDescriptor, RuleAction, TableDependency,
};

/// Everything discovery learned about the requested tables.
///
/// Consumed by the row-generation engine to order table population and to
/// feed the constraint handler registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintMetadata {
    pub rules_by_table: BTreeMap<String, Vec<BusinessRule>>,
    pub dependencies: Vec<TableDependency>,
    pub graph: DependencyGraph,
    /// Arithmetic mean of all extracted rule confidences, 0 when none.
    pub confidence: f64,
    pub warnings: Vec<String>,
}

impl ConstraintMetadata {
    pub fn rule_count(&self) -> usize {
        self.rules_by_table.values().map(Vec::len).sum()
    }
}

/// Discovers business rules from trigger/function catalogs.
///
/// Both caches are owned by the engine instance; hosts wanting isolation
/// between runs construct one engine per run.
pub struct ConstraintDiscovery<C> {
    catalog: C,
    discovery_cache: TtlCache<Vec<String>, ConstraintMetadata>,
    function_cache: TtlCache<String, FunctionDescriptor>,
}

impl<C: TriggerCatalog> ConstraintDiscovery<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            discovery_cache: TtlCache::with_default_ttl(),
            function_cache: TtlCache::with_default_ttl(),
        }
    }

    /// Drop both caches as a unit.
    pub fn clear_caches(&self) {
        self.discovery_cache.clear();
        self.function_cache.clear();
    }

    /// Discover constraints for the given tables.
    pub async fn discover(&self, tables: &[String]) -> Result<ConstraintMetadata> {
        self.discover_with_snapshot(tables, None).await
    }

    /// Discover constraints, sanity-checking extracted rules against a
    /// schema snapshot when one is available.
    pub async fn discover_with_snapshot(
        &self,
        tables: &[String],
        snapshot: Option<&SchemaSnapshot>,
    ) -> Result<ConstraintMetadata> {
        let start = Instant::now();
        let table_set = normalize_tables(tables);

        if let Some(cached) = self.discovery_cache.get(&table_set) {
            debug!(tables = table_set.len(), "discovery cache hit");
            return Ok(cached);
        }

        let triggers = self.catalog.list_triggers(&table_set).await?;
        info!(
            tables = table_set.len(),
            triggers = triggers.len(),
            "trigger discovery completed"
        );

        // One extraction per (table, function) pair: several triggers on a
        // table commonly share one function.
        let mut extraction_targets: BTreeSet<(String, String)> = BTreeSet::new();
        for trigger in &triggers {
            extraction_targets.insert((
                trigger.table.to_lowercase(),
                trigger.function_name.to_lowercase(),
            ));
        }

        let mut warnings = Vec::new();
        let mut rules_by_table: BTreeMap<String, Vec<BusinessRule>> = BTreeMap::new();
        for table in &table_set {
            rules_by_table.entry(table.clone()).or_default();
        }

        for (table, function_name) in &extraction_targets {
            let Some(function) = self.load_function(function_name, &mut warnings).await else {
                continue;
            };

            let mut rules = extract_rules(&function, table);
            if let Some(snapshot) = snapshot {
                sanity_check_rules(&mut rules, snapshot, &mut warnings);
            }
            rules_by_table.entry(table.clone()).or_default().extend(rules);
        }

        let dependencies = collect_dependencies(&rules_by_table);
        let graph = build_graph(&dependencies);
        let confidences: Vec<f64> = rules_by_table
            .values()
            .flatten()
            .map(|rule| rule.confidence)
            .collect();
        let confidence = scoring::mean(&confidences);

        let metadata = ConstraintMetadata {
            rules_by_table,
            dependencies,
            graph,
            confidence,
            warnings,
        };

        info!(
            tables = table_set.len(),
            rules = metadata.rule_count(),
            dependencies = metadata.dependencies.len(),
            cycles = metadata.graph.cycles.len(),
            confidence = metadata.confidence,
            duration_ms = start.elapsed().as_millis() as u64,
            "constraint discovery completed"
        );

        self.discovery_cache.put(table_set, metadata.clone());
        Ok(metadata)
    }

    async fn load_function(
        &self,
        name: &str,
        warnings: &mut Vec<String>,
    ) -> Option<FunctionDescriptor> {
        if let Some(function) = self.function_cache.get(&name.to_string()) {
            return Some(function);
        }

        match self.catalog.function_definition(name).await {
            Ok(Some(function)) => {
                self.function_cache.put(name.to_string(), function.clone());
                Some(function)
            }
            Ok(None) => {
                warn!(function = name, "function definition not found, skipping");
                warnings.push(format!("function '{name}' not found in catalog"));
                None
            }
            Err(err) => {
                warn!(function = name, error = %err, "function definition fetch failed, skipping");
                warnings.push(format!("function '{name}' could not be loaded: {err}"));
                None
            }
        }
    }
}

fn normalize_tables(tables: &[String]) -> Vec<String> {
    let set: BTreeSet<String> = tables.iter().map(|table| table.to_lowercase()).collect();
    set.into_iter().collect()
}

/// Halve the confidence of rules whose fixed column does not exist on the
/// table their condition reads. Extraction still never fails.
fn sanity_check_rules(
    rules: &mut [BusinessRule],
    snapshot: &SchemaSnapshot,
    warnings: &mut Vec<String>,
) {
    for rule in rules {
        let Some(field) = rule
            .auto_fix
            .as_ref()
            .and_then(|fix| fix.field.as_deref())
        else {
            continue;
        };
        let target = rule
            .dependencies
            .first()
            .cloned()
            .unwrap_or_else(|| rule.table.clone());
        if snapshot.table(&target).is_some() && !snapshot.table_has_column(&target, field) {
            rule.confidence /= 2.0;
            warnings.push(format!(
                "rule '{}' references column '{field}' missing from table '{target}'",
                rule.name
            ));
        }
    }
}

fn collect_dependencies(
    rules_by_table: &BTreeMap<String, Vec<BusinessRule>>,
) -> Vec<TableDependency> {
    let mut dependencies = Vec::new();
    for rules in rules_by_table.values() {
        for rule in rules {
            for dep in &rule.dependencies {
                dependencies.push(TableDependency {
                    from_table: rule.table.clone(),
                    to_table: dep.clone(),
                    relationship: if rule.action == RuleAction::Require {
                        DependencyKind::Required
                    } else {
                        DependencyKind::Conditional
                    },
                    condition: Some(rule.condition.clone()),
                    constraint_name: rule.name.clone(),
                });
            }
        }
    }
    dependencies
}
