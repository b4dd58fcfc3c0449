use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{DependencyKind, TableDependency};

/// One table in the dependency graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub table: String,
    /// Tables this table's rules point to (must exist first).
    pub dependencies: Vec<String>,
    /// Tables that point back at this table.
    pub dependents: Vec<String>,
}

/// A typed edge in the dependency graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from_table: String,
    pub to_table: String,
    pub relationship: DependencyKind,
}

/// A back-edge dropped to break a dependency cycle.
///
/// Cycles are reported, never silently skipped: the caller can decide
/// whether the resulting order is acceptable for its data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokenCycle {
    pub from_table: String,
    pub to_table: String,
    /// The visiting path at the moment the back-edge was found.
    pub path: Vec<String>,
}

/// Directed table dependency graph with a safe linear creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyGraph {
    pub nodes: BTreeMap<String, GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub cycles: Vec<BrokenCycle>,
    /// Every table exactly once; each table after its dependencies unless
    /// a reported cycle forced a tie-break.
    pub creation_order: Vec<String>,
}

/// Build the graph and compute the creation order from a flat dependency
/// list. Deterministic: traversal is lexicographic, so unchanged input
/// always yields the same order.
pub fn build_graph(dependencies: &[TableDependency]) -> DependencyGraph {
    let mut adjacency: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut reverse: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut edges = Vec::new();

    for dependency in dependencies {
        let from = dependency.from_table.to_lowercase();
        let to = dependency.to_table.to_lowercase();
        adjacency.entry(from.clone()).or_default().insert(to.clone());
        adjacency.entry(to.clone()).or_default();
        reverse.entry(to.clone()).or_default().insert(from.clone());
        reverse.entry(from.clone()).or_default();
        edges.push(GraphEdge {
            from_table: from,
            to_table: to,
            relationship: dependency.relationship,
        });
    }

    let mut order = Vec::with_capacity(adjacency.len());
    let mut visited: BTreeSet<String> = BTreeSet::new();
    let mut visiting: Vec<String> = Vec::new();
    let mut cycles = Vec::new();

    for table in adjacency.keys() {
        visit(
            table,
            &adjacency,
            &mut visited,
            &mut visiting,
            &mut order,
            &mut cycles,
        );
    }

    let nodes = adjacency
        .iter()
        .map(|(table, deps)| {
            (
                table.clone(),
                GraphNode {
                    table: table.clone(),
                    dependencies: deps.iter().cloned().collect(),
                    dependents: reverse
                        .get(table)
                        .map(|set| set.iter().cloned().collect())
                        .unwrap_or_default(),
                },
            )
        })
        .collect();

    DependencyGraph {
        nodes,
        edges,
        cycles,
        creation_order: order,
    }
}

fn visit(
    table: &str,
    adjacency: &BTreeMap<String, BTreeSet<String>>,
    visited: &mut BTreeSet<String>,
    visiting: &mut Vec<String>,
    order: &mut Vec<String>,
    cycles: &mut Vec<BrokenCycle>,
) {
    if visited.contains(table) {
        return;
    }
    if visiting.iter().any(|entry| entry == table) {
        return;
    }

    visiting.push(table.to_string());

    if let Some(deps) = adjacency.get(table) {
        for dep in deps {
            if visiting.iter().any(|entry| entry == dep) {
                // Back-edge: record the cycle and drop the edge.
                cycles.push(BrokenCycle {
                    from_table: table.to_string(),
                    to_table: dep.clone(),
                    path: visiting.clone(),
                });
                continue;
            }
            visit(dep, adjacency, visited, visiting, order, cycles);
        }
    }

    visiting.pop();
    visited.insert(table.to_string());
    order.push(table.to_string());
}
