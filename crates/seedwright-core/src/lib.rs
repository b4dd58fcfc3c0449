//! Core contracts and helpers for Seedwright.
//!
//! This crate defines the evidence model, classification result types,
//! confidence scoring, fingerprints, and the TTL cache shared by the
//! detection and discovery engines.

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod scoring;
pub mod snapshot;

mod redaction;

pub use cache::{DEFAULT_TTL, TtlCache};
pub use classify::{
    ArchitectureType, ClassificationResult, ConfidenceLevel, ConflictSeverity, ConflictType,
    ContentDomain, DetectionConflict, Evidence, MAX_SECONDARY,
};
pub use config::{ClassificationStrategy, DetectionConfig};
pub use error::{Error, Result};
pub use fingerprint::{config_fingerprint, schema_fingerprint};
pub use redaction::redact_connection_string;
pub use snapshot::{
    ColumnInfo, IntegrityRule, RelationshipInfo, RelationshipKind, SchemaSnapshot, TableInfo,
};
