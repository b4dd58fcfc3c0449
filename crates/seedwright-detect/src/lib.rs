//! Schema detection: architecture and domain classification with
//! cross-validated integration.
//!
//! The classifiers score a read-only [`seedwright_core::SchemaSnapshot`]
//! against fixed signal vocabularies; the integrator composes them with the
//! external framework detector, cross-validates pairwise, detects conflicts,
//! and emits one unified verdict for the configuration layer.

pub mod architecture;
pub mod conflicts;
pub mod crossval;
pub mod domain;
pub mod integrator;
pub mod model;
pub mod signals;
pub mod sources;

pub use architecture::ArchitectureClassifier;
pub use conflicts::detect_conflicts;
pub use crossval::{cross_validate, domain_architecture_alignment};
pub use domain::DomainClassifier;
pub use integrator::DetectionIntegrator;
pub use model::{
    CrossValidation, DetectionPerformance, FrameworkDetection, IntegrationSummary,
    SchemaDetectionSummary, UnifiedDetectionResult,
};
pub use sources::{FrameworkDetector, SchemaSource};
