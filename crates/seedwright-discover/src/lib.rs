//! Constraint discovery: reverse-engineering business rules from trigger
//! and function definitions.
//!
//! The engine queries the trigger catalog (with a portable fallback),
//! extracts structured [`BusinessRule`]s from function bodies via a fixed
//! idiom grammar, and builds the table dependency graph whose
//! `creation_order` the row-generation engine follows.

pub mod catalog;
pub mod engine;
pub mod extract;
pub mod graph;
pub mod model;

pub use catalog::{PostgresCatalog, TriggerCatalog};
pub use engine::{ConstraintDiscovery, ConstraintMetadata};
pub use extract::extract_rules;
pub use graph::{BrokenCycle, DependencyGraph, GraphEdge, GraphNode, build_graph};
pub use model::{
    AutoFixKind, AutoFixSuggestion, BusinessRule, DependencyKind, FunctionDescriptor, RuleAction,
    RuleType, TableDependency, TriggerDescriptor,
};
