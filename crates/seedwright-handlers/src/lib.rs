//! Constraint handler registry: per-row fix-ups before insertion.
//!
//! Every candidate row runs through [`HandlerRegistry::apply`] for each of
//! its table's constraints. Specific handlers rewrite rows to satisfy known
//! idioms; generic fallbacks recognize a few raw constraint shapes and
//! attach warnings. Unresolvable constraints surface as `bypass_required`
//! for the row-generation caller to act on.

pub mod builtin;
pub mod generic;
pub mod handler;
pub mod model;
pub mod registry;

pub use builtin::{
    AccountTypeConsistencyHandler, OwnerRoleFlagHandler, PersonalAccountSlugHandler,
};
pub use generic::{
    GenericBusinessRuleHandler, GenericCheckHandler, GenericForeignKeyHandler,
    GenericNotNullHandler, GenericUniqueHandler,
};
pub use handler::ConstraintHandler;
pub use model::{
    AppliedFix, ConstraintDescriptor, ConstraintHandlingResult, ConstraintType, Row,
};
pub use registry::HandlerRegistry;
