use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use seedwright_core::{
    ArchitectureType, ClassificationResult, ContentDomain, DetectionConflict,
};

/// Externally supplied guess about which application scaffold the schema
/// matches. Consumed for cross-validation only.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FrameworkDetection {
    /// Framework label when one matched (e.g. `makerkit`, `supabase-starter`).
    pub framework: Option<String>,
    pub confidence: f64,
    /// Whether the matched scaffold models team/organization accounts.
    pub supports_teams: bool,
    pub version: Option<String>,
}

impl FrameworkDetection {
    /// Degraded default used when the external detector fails.
    pub fn unknown() -> Self {
        Self {
            framework: None,
            confidence: 0.0,
            supports_teams: false,
            version: None,
        }
    }
}

/// Summary of the external schema introspection result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SchemaDetectionSummary {
    pub table_count: usize,
    pub relationship_count: usize,
    pub integrity_rule_count: usize,
    pub fingerprint: String,
    /// Completeness confidence: how much signal introspection delivered.
    pub confidence: f64,
}

/// Pairwise agreement scores between detection subsystems.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CrossValidation {
    pub architecture_framework: f64,
    pub schema_architecture: f64,
    pub domain_architecture: f64,
    /// Arithmetic mean of the three pairwise scores.
    pub overall_agreement: f64,
}

/// Wall-clock durations per detection stage, in milliseconds.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct DetectionPerformance {
    pub schema_ms: u64,
    pub framework_ms: u64,
    pub architecture_ms: u64,
    pub domain_ms: u64,
    pub integration_ms: u64,
    pub total_ms: u64,
}

/// Weighted verdict across all detection subsystems.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IntegrationSummary {
    pub overall_confidence: f64,
    pub cross_validation: CrossValidation,
    pub conflicts: Vec<DetectionConflict>,
    pub recommendations: Vec<String>,
    pub performance: DetectionPerformance,
}

/// The unified result consumed by the configuration-composition layer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UnifiedDetectionResult {
    pub architecture: ClassificationResult<ArchitectureType>,
    pub domain: ClassificationResult<ContentDomain>,
    pub framework: FrameworkDetection,
    pub schema: SchemaDetectionSummary,
    pub integration: IntegrationSummary,
    /// UTC timestamp of the run that produced this result; cached entries
    /// keep the original.
    pub detected_at: String,
}

/// RFC 3339-style UTC timestamp for detection results.
pub(crate) fn utc_timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
