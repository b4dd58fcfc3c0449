use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::scoring;

/// A single weighted, confidence-scored observation supporting a
/// classification. Evidences are produced by scoring passes and aggregated;
/// no classifier owns them.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Evidence {
    pub evidence_type: String,
    pub description: String,
    pub confidence: f64,
    pub weight: f64,
}

impl Evidence {
    pub fn new(
        evidence_type: impl Into<String>,
        description: impl Into<String>,
        confidence: f64,
        weight: f64,
    ) -> Self {
        Self {
            evidence_type: evidence_type.into(),
            description: description.into(),
            confidence: scoring::clamp_unit(confidence),
            weight: weight.max(f64::MIN_POSITIVE),
        }
    }
}

/// Coarse platform architecture a schema can represent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArchitectureType {
    Individual,
    Team,
    Hybrid,
}

impl ArchitectureType {
    pub const ALL: [ArchitectureType; 3] = [
        ArchitectureType::Individual,
        ArchitectureType::Team,
        ArchitectureType::Hybrid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchitectureType::Individual => "individual",
            ArchitectureType::Team => "team",
            ArchitectureType::Hybrid => "hybrid",
        }
    }
}

/// Business vertical a schema's data models resemble.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentDomain {
    Outdoor,
    Saas,
    Ecommerce,
    Social,
    Generic,
}

impl ContentDomain {
    pub const ALL: [ContentDomain; 5] = [
        ContentDomain::Outdoor,
        ContentDomain::Saas,
        ContentDomain::Ecommerce,
        ContentDomain::Social,
        ContentDomain::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentDomain::Outdoor => "outdoor",
            ContentDomain::Saas => "saas",
            ContentDomain::Ecommerce => "ecommerce",
            ContentDomain::Social => "social",
            ContentDomain::Generic => "generic",
        }
    }
}

/// Fixed confidence bands over [0, 1].
///
/// The five bands are contiguous and non-overlapping: [0, 0.2), [0.2, 0.4),
/// [0.4, 0.6), [0.6, 0.8), [0.8, 1.0].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    /// Band a confidence score into its level.
    pub fn from_confidence(confidence: f64) -> Self {
        let confidence = scoring::clamp_unit(confidence);
        if confidence < 0.2 {
            ConfidenceLevel::VeryLow
        } else if confidence < 0.4 {
            ConfidenceLevel::Low
        } else if confidence < 0.6 {
            ConfidenceLevel::Medium
        } else if confidence < 0.8 {
            ConfidenceLevel::High
        } else {
            ConfidenceLevel::VeryHigh
        }
    }
}

/// Maximum number of secondary candidates retained on a result.
pub const MAX_SECONDARY: usize = 3;

/// Outcome of one classification run (architecture or domain).
///
/// Created fresh per detection call or restored from cache; never mutated
/// after construction.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationResult<L> {
    pub primary: L,
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    /// Ranked runners-up, all strictly below `confidence`, at most three.
    pub secondary: Vec<(L, f64)>,
    pub evidence: Vec<Evidence>,
    pub hybrid: bool,
    pub reasoning: Vec<String>,
    pub warnings: Vec<String>,
}

impl<L: Copy + PartialEq> ClassificationResult<L> {
    /// Build a result from ranked `(label, score)` candidates.
    ///
    /// The top candidate becomes primary. Runners-up are retained only when
    /// `detect_secondary` is set and they clear the moderate threshold; the
    /// hybrid flag is raised when two or more candidates clear it.
    pub fn from_ranked(
        mut ranked: Vec<(L, f64)>,
        evidence: Vec<Evidence>,
        reasoning: Vec<String>,
        detect_secondary: bool,
        fallback_label: L,
    ) -> Self {
        ranked.sort_by(|left, right| {
            right
                .1
                .partial_cmp(&left.1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let (primary, confidence) = ranked
            .first()
            .copied()
            .unwrap_or((fallback_label, scoring::FALLBACK_CONFIDENCE));
        let confidence = scoring::clamp_unit(confidence);

        let moderate_count = ranked
            .iter()
            .filter(|(_, score)| *score >= scoring::MODERATE_THRESHOLD)
            .count();

        let secondary: Vec<(L, f64)> = if detect_secondary {
            ranked
                .iter()
                .skip(1)
                .filter(|(_, score)| {
                    *score >= scoring::MODERATE_THRESHOLD && *score < confidence
                })
                .take(MAX_SECONDARY)
                .copied()
                .collect()
        } else {
            Vec::new()
        };

        Self {
            primary,
            confidence,
            confidence_level: ConfidenceLevel::from_confidence(confidence),
            secondary,
            evidence,
            hybrid: moderate_count >= 2,
            reasoning,
            warnings: Vec::new(),
        }
    }

    /// Result for a manual override: scoring is bypassed entirely.
    pub fn manual_override(label: L) -> Self {
        Self {
            primary: label,
            confidence: scoring::MANUAL_OVERRIDE_CONFIDENCE,
            confidence_level: ConfidenceLevel::from_confidence(
                scoring::MANUAL_OVERRIDE_CONFIDENCE,
            ),
            secondary: Vec::new(),
            evidence: Vec::new(),
            hybrid: false,
            reasoning: vec!["automatic detection bypassed by manual override".to_string()],
            warnings: Vec::new(),
        }
    }

    /// Low-confidence fallback returned when classification fails
    /// internally. Classification never aborts the pipeline.
    pub fn fallback(label: L, reason: impl Into<String>) -> Self {
        Self {
            primary: label,
            confidence: scoring::FALLBACK_CONFIDENCE,
            confidence_level: ConfidenceLevel::from_confidence(scoring::FALLBACK_CONFIDENCE),
            secondary: Vec::new(),
            evidence: Vec::new(),
            hybrid: false,
            reasoning: vec!["detection failed".to_string()],
            warnings: vec![reason.into()],
        }
    }

    /// Return a copy with the given confidence, keeping the secondary
    /// invariant intact.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        let confidence = scoring::clamp_unit(confidence);
        self.secondary.retain(|(_, score)| *score < confidence);
        self.confidence = confidence;
        self.confidence_level = ConfidenceLevel::from_confidence(confidence);
        self
    }
}

/// Which detection subsystems a conflict involves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    ArchitectureMismatch,
    FrameworkMismatch,
    SchemaInconsistency,
}

/// Severity of a detection conflict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

/// Disagreement between two detection subsystems, produced by rule-based
/// comparators only. A conflict is data for the caller, never an error.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DetectionConflict {
    pub conflict_type: ConflictType,
    pub description: String,
    pub severity: ConflictSeverity,
    pub suggested_resolution: String,
    pub involved_systems: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_partition_the_unit_interval() {
        let cuts = [
            (0.0, ConfidenceLevel::VeryLow),
            (0.199, ConfidenceLevel::VeryLow),
            (0.2, ConfidenceLevel::Low),
            (0.399, ConfidenceLevel::Low),
            (0.4, ConfidenceLevel::Medium),
            (0.599, ConfidenceLevel::Medium),
            (0.6, ConfidenceLevel::High),
            (0.799, ConfidenceLevel::High),
            (0.8, ConfidenceLevel::VeryHigh),
            (1.0, ConfidenceLevel::VeryHigh),
        ];
        for (score, expected) in cuts {
            assert_eq!(ConfidenceLevel::from_confidence(score), expected);
        }
    }

    #[test]
    fn secondary_entries_stay_below_primary_and_descend() {
        let ranked = vec![
            (ArchitectureType::Team, 0.9),
            (ArchitectureType::Hybrid, 0.7),
            (ArchitectureType::Individual, 0.55),
        ];
        let result = ClassificationResult::from_ranked(
            ranked,
            Vec::new(),
            Vec::new(),
            true,
            ArchitectureType::Individual,
        );
        assert_eq!(result.primary, ArchitectureType::Team);
        assert!(result.secondary.len() <= MAX_SECONDARY);
        let mut last = result.confidence;
        for (_, score) in &result.secondary {
            assert!(*score < result.confidence);
            assert!(*score <= last);
            last = *score;
        }
        assert!(result.hybrid);
    }

    #[test]
    fn secondary_dropped_when_detection_disabled() {
        let ranked = vec![(ContentDomain::Saas, 0.8), (ContentDomain::Social, 0.6)];
        let result = ClassificationResult::from_ranked(
            ranked,
            Vec::new(),
            Vec::new(),
            false,
            ContentDomain::Generic,
        );
        assert!(result.secondary.is_empty());
    }

    #[test]
    fn manual_override_is_exact() {
        let result = ClassificationResult::manual_override(ArchitectureType::Hybrid);
        assert_eq!(result.confidence, 0.95);
        assert!(
            result
                .reasoning
                .iter()
                .any(|line| line.contains("bypassed"))
        );
    }

    #[test]
    fn fallback_reports_failure() {
        let result =
            ClassificationResult::fallback(ContentDomain::Generic, "scoring panicked");
        assert!((result.confidence - 0.3).abs() < 1e-9);
        assert_eq!(result.reasoning, vec!["detection failed".to_string()]);
        assert_eq!(result.warnings, vec!["scoring panicked".to_string()]);
    }
}
