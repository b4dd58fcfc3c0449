use crate::model::{ConstraintDescriptor, ConstraintHandlingResult, ConstraintType, Row};

/// A registered matcher + fixer for one recognizable constraint shape.
///
/// Handlers are registered once at startup and must be stateless across
/// calls; the registry dispatches to the highest-priority handler whose
/// `can_handle` accepts the pair.
pub trait ConstraintHandler: Send + Sync {
    /// Stable identifier, used in logs and fix provenance.
    fn id(&self) -> &'static str;

    /// The constraint shape this handler dispatches on.
    fn constraint_type(&self) -> ConstraintType;

    /// Higher priority runs first within a constraint type.
    fn priority(&self) -> u32;

    /// Cheap predicate: does this handler apply to the pair?
    fn can_handle(&self, constraint: &ConstraintDescriptor, row: &Row) -> bool;

    /// Rewrite the candidate row to satisfy the constraint.
    fn handle(&self, constraint: &ConstraintDescriptor, row: &Row) -> ConstraintHandlingResult;
}
