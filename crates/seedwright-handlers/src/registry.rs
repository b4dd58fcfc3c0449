//! Priority-ordered constraint handler registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::builtin::{
    AccountTypeConsistencyHandler, OwnerRoleFlagHandler, PersonalAccountSlugHandler,
};
use crate::generic::{
    GenericBusinessRuleHandler, GenericCheckHandler, GenericForeignKeyHandler,
    GenericNotNullHandler, GenericUniqueHandler,
};
use crate::handler::ConstraintHandler;
use crate::model::{ConstraintDescriptor, ConstraintHandlingResult, ConstraintType, Row};

/// Registry of constraint handlers, dispatched by type and priority.
///
/// Specific handlers are stored sorted by descending priority (ties broken
/// by id, so registration order never matters). Each constraint type also
/// carries one generic fallback that runs when no specific handler matches.
pub struct HandlerRegistry {
    specific: BTreeMap<ConstraintType, Vec<Arc<dyn ConstraintHandler>>>,
    generic: BTreeMap<ConstraintType, Arc<dyn ConstraintHandler>>,
}

impl HandlerRegistry {
    /// An empty registry with no handlers at all.
    pub fn empty() -> Self {
        Self {
            specific: BTreeMap::new(),
            generic: BTreeMap::new(),
        }
    }

    /// The standard registry: generic fallbacks for every constraint type
    /// plus the built-in ownership idiom handlers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();

        registry.register_generic(Arc::new(GenericNotNullHandler));
        registry.register_generic(Arc::new(GenericForeignKeyHandler));
        registry.register_generic(Arc::new(GenericUniqueHandler));
        registry.register_generic(Arc::new(GenericCheckHandler));
        registry.register_generic(Arc::new(GenericBusinessRuleHandler));

        registry.register(Arc::new(PersonalAccountSlugHandler));
        registry.register(Arc::new(OwnerRoleFlagHandler));
        registry.register(Arc::new(AccountTypeConsistencyHandler));

        registry
    }

    /// Register a specific handler, keeping the type's list priority-sorted.
    pub fn register(&mut self, handler: Arc<dyn ConstraintHandler>) {
        let handlers = self.specific.entry(handler.constraint_type()).or_default();
        handlers.push(handler);
        handlers.sort_by(|left, right| {
            right
                .priority()
                .cmp(&left.priority())
                .then_with(|| left.id().cmp(right.id()))
        });
    }

    /// Replace the generic fallback for a constraint type.
    pub fn register_generic(&mut self, handler: Arc<dyn ConstraintHandler>) {
        self.generic.insert(handler.constraint_type(), handler);
    }

    /// Number of specific handlers registered for a type.
    pub fn specific_count(&self, constraint_type: ConstraintType) -> usize {
        self.specific
            .get(&constraint_type)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Run one constraint against one candidate row.
    ///
    /// The first specific handler (in priority order) whose `can_handle`
    /// accepts the pair wins; otherwise the type's generic fallback runs.
    /// With no generic registered either, the result requires bypass.
    pub fn apply(&self, constraint: &ConstraintDescriptor, row: &Row) -> ConstraintHandlingResult {
        if let Some(handlers) = self.specific.get(&constraint.constraint_type) {
            for handler in handlers {
                if handler.can_handle(constraint, row) {
                    debug!(
                        handler = handler.id(),
                        constraint = %constraint.name,
                        "specific handler matched"
                    );
                    return handler.handle(constraint, row);
                }
            }
        }

        if let Some(handler) = self.generic.get(&constraint.constraint_type) {
            debug!(
                handler = handler.id(),
                constraint = %constraint.name,
                "falling back to generic handler"
            );
            return handler.handle(constraint, row);
        }

        ConstraintHandlingResult::bypass(
            row,
            format!("no handler registered for constraint '{}'", constraint.name),
        )
    }

    /// Run every constraint against the row, threading fixes through so
    /// later constraints see earlier corrections.
    pub fn apply_all(
        &self,
        constraints: &[ConstraintDescriptor],
        row: &Row,
    ) -> ConstraintHandlingResult {
        let mut combined = ConstraintHandlingResult::unchanged(row);

        for constraint in constraints {
            let result = self.apply(constraint, &combined.modified_row);
            combined.modified_row = result.modified_row;
            combined.applied_fixes.extend(result.applied_fixes);
            combined.warnings.extend(result.warnings);
            combined.errors.extend(result.errors);
            combined.success &= result.success;
            combined.bypass_required |= result.bypass_required;
        }

        combined
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
