//! Architecture classification: individual, team, or hybrid.

use tracing::{debug, warn};

use seedwright_core::{
    ArchitectureType, ClassificationResult, ClassificationStrategy, DetectionConfig, Error,
    Evidence, Result, SchemaSnapshot, scoring,
};

use crate::signals;

/// Scores a schema snapshot against the fixed set of architecture types.
#[derive(Debug, Clone, Default)]
pub struct ArchitectureClassifier;

impl ArchitectureClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify the snapshot. Never fails: internal errors degrade to the
    /// low-confidence fallback result.
    pub fn classify(
        &self,
        snapshot: &SchemaSnapshot,
        config: &DetectionConfig,
    ) -> ClassificationResult<ArchitectureType> {
        if let Some(label) = config.manual_architecture {
            debug!(architecture = label.as_str(), "manual architecture override");
            return ClassificationResult::manual_override(label);
        }

        match self.classify_inner(snapshot, config) {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "architecture classification failed");
                ClassificationResult::fallback(ArchitectureType::Individual, err.to_string())
            }
        }
    }

    fn classify_inner(
        &self,
        snapshot: &SchemaSnapshot,
        config: &DetectionConfig,
    ) -> Result<ClassificationResult<ArchitectureType>> {
        if snapshot.is_empty() {
            return Err(Error::InvalidSnapshot(
                "snapshot contains no tables".to_string(),
            ));
        }

        let fast = config.strategy == ClassificationStrategy::Fast;
        let mut reasoning = Vec::new();
        let mut all_evidence = Vec::new();
        let mut ranked = Vec::new();

        for label in ArchitectureType::ALL {
            let evidence = score_label(snapshot, label, fast);
            let score = scoring::weighted_confidence(&evidence);
            if let Some(top) = evidence.first() {
                reasoning.push(format!(
                    "{}: {:.2} ({})",
                    label.as_str(),
                    score,
                    top.description
                ));
            }
            all_evidence.extend(evidence);
            ranked.push((label, score));
        }

        let result = ClassificationResult::from_ranked(
            ranked,
            all_evidence,
            reasoning,
            config.detect_secondary,
            ArchitectureType::Individual,
        );

        Ok(apply_strategy(result, config.strategy, ArchitectureType::Individual))
    }
}

/// Apply the configured strategy's confidence arithmetic to a scored result.
///
/// Shared with the domain classifier; `baseline` is the label substituted by
/// the conservative strategy when nothing scores strongly.
pub(crate) fn apply_strategy<L: Copy + PartialEq>(
    result: ClassificationResult<L>,
    strategy: ClassificationStrategy,
    baseline: L,
) -> ClassificationResult<L> {
    let result = match strategy {
        ClassificationStrategy::Comprehensive => result,
        ClassificationStrategy::Fast => {
            let confidence = scoring::discount(result.confidence, scoring::FAST_DISCOUNT);
            let mut result = result.with_confidence(confidence);
            result
                .reasoning
                .push("fast strategy: reduced signal set, discounted".to_string());
            result
        }
        ClassificationStrategy::Conservative => {
            let mut result = if result.confidence < scoring::STRONG_THRESHOLD {
                let mut substituted = ClassificationResult::from_ranked(
                    vec![(baseline, scoring::CONSERVATIVE_FLOOR)],
                    result.evidence,
                    result.reasoning,
                    false,
                    baseline,
                );
                substituted.reasoning.push(
                    "conservative strategy: no strong signal, baseline substituted".to_string(),
                );
                substituted
            } else {
                result
            };
            let confidence =
                scoring::discount(result.confidence, scoring::CONSERVATIVE_DISCOUNT);
            result = result.with_confidence(confidence);
            result
        }
        ClassificationStrategy::Aggressive => {
            let confidence = scoring::boost(result.confidence);
            let mut result = result.with_confidence(confidence);
            result
                .reasoning
                .push("aggressive strategy: top result boosted".to_string());
            result
        }
    };

    // No strategy reports certainty.
    let capped = result.confidence.min(scoring::CONFIDENCE_CAP);
    result.with_confidence(capped)
}

fn score_label(
    snapshot: &SchemaSnapshot,
    label: ArchitectureType,
    fast: bool,
) -> Vec<Evidence> {
    match label {
        ArchitectureType::Team => score_team(snapshot),
        ArchitectureType::Individual => score_individual(snapshot, fast),
        ArchitectureType::Hybrid => score_hybrid(snapshot),
    }
}

fn score_team(snapshot: &SchemaSnapshot) -> Vec<Evidence> {
    let mut evidence = Vec::new();

    for table in signals::team_tables_present(snapshot) {
        let (confidence, weight) = match table.as_str() {
            "teams" | "team_members" | "organizations" | "organization_members" => (0.9, 2.0),
            _ => (0.8, 1.0),
        };
        evidence.push(Evidence::new(
            "table_name",
            format!("team table '{table}' present"),
            confidence,
            weight,
        ));
    }

    for column in signals::membership_columns_present(snapshot) {
        evidence.push(Evidence::new(
            "column_name",
            format!("membership column '{column}' present"),
            0.7,
            1.0,
        ));
    }

    evidence
}

fn score_individual(snapshot: &SchemaSnapshot, fast: bool) -> Vec<Evidence> {
    let mut evidence = Vec::new();
    let user_tables = signals::user_tables_present(snapshot);
    let team_tables = signals::team_tables_present(snapshot);

    if !user_tables.is_empty() && team_tables.is_empty() {
        evidence.push(Evidence::new(
            "table_name",
            format!("user tables {user_tables:?} without team structures"),
            0.8,
            2.0,
        ));
    } else if !user_tables.is_empty() {
        evidence.push(Evidence::new(
            "table_name",
            "user tables present alongside team structures",
            0.3,
            1.0,
        ));
    }

    if !fast && team_tables.is_empty() {
        let user_fk_count = snapshot
            .relationships
            .iter()
            .filter(|rel| rel.column.eq_ignore_ascii_case("user_id"))
            .count();
        if user_fk_count >= 2 {
            evidence.push(Evidence::new(
                "relationship",
                format!("{user_fk_count} relationships keyed by user_id"),
                0.7,
                1.0,
            ));
        }
    }

    evidence
}

fn score_hybrid(snapshot: &SchemaSnapshot) -> Vec<Evidence> {
    let mut evidence = Vec::new();
    let personal_marker = signals::has_personal_account_marker(snapshot);
    let team_tables = signals::team_tables_present(snapshot);

    if personal_marker {
        evidence.push(Evidence::new(
            "column_name",
            "personal-account marker column present",
            0.9,
            2.0,
        ));
    }

    if personal_marker && !team_tables.is_empty() {
        evidence.push(Evidence::new(
            "table_name",
            "team structures coexist with personal accounts",
            0.9,
            1.5,
        ));
    } else if !team_tables.is_empty() && snapshot.has_table("accounts") {
        evidence.push(Evidence::new(
            "table_name",
            "accounts table next to team structures",
            0.4,
            1.0,
        ));
    }

    evidence
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedwright_core::{ColumnInfo, ConfidenceLevel, TableInfo};

    fn snapshot_with(tables: &[(&str, &[&str])]) -> SchemaSnapshot {
        SchemaSnapshot {
            tables: tables
                .iter()
                .map(|(name, columns)| TableInfo {
                    name: name.to_string(),
                    columns: columns
                        .iter()
                        .map(|column| ColumnInfo {
                            name: column.to_string(),
                            data_type: "text".to_string(),
                            is_nullable: true,
                        })
                        .collect(),
                })
                .collect(),
            relationships: Vec::new(),
            integrity_rules: Vec::new(),
        }
    }

    fn team_snapshot() -> SchemaSnapshot {
        snapshot_with(&[
            ("teams", &["id", "name"]),
            ("team_members", &["team_id", "user_id", "role"]),
            ("invitations", &["team_id", "email"]),
            ("users", &["id", "email"]),
        ])
    }

    #[test]
    fn team_schema_classifies_as_team_with_high_confidence() {
        let result = ArchitectureClassifier::new()
            .classify(&team_snapshot(), &DetectionConfig::default());
        assert_eq!(result.primary, ArchitectureType::Team);
        assert!(matches!(
            result.confidence_level,
            ConfidenceLevel::High | ConfidenceLevel::VeryHigh
        ));
    }

    #[test]
    fn personal_marker_flags_hybrid() {
        let snapshot = snapshot_with(&[
            ("accounts", &["id", "is_personal_account", "slug"]),
            ("teams", &["id"]),
            ("team_members", &["team_id", "account_id"]),
        ]);
        let result =
            ArchitectureClassifier::new().classify(&snapshot, &DetectionConfig::default());
        assert_eq!(result.primary, ArchitectureType::Hybrid);
    }

    #[test]
    fn empty_snapshot_degrades_to_fallback() {
        let result = ArchitectureClassifier::new()
            .classify(&SchemaSnapshot::empty(), &DetectionConfig::default());
        assert!((result.confidence - 0.3).abs() < 1e-9);
        assert_eq!(result.reasoning, vec!["detection failed".to_string()]);
    }

    #[test]
    fn manual_override_bypasses_scoring() {
        let config = DetectionConfig {
            manual_architecture: Some(ArchitectureType::Hybrid),
            ..DetectionConfig::default()
        };
        let result = ArchitectureClassifier::new().classify(&SchemaSnapshot::empty(), &config);
        assert_eq!(result.primary, ArchitectureType::Hybrid);
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn strategy_ordering_on_strong_signal() {
        let snapshot = team_snapshot();
        let classify = |strategy| {
            let config = DetectionConfig {
                strategy,
                ..DetectionConfig::default()
            };
            ArchitectureClassifier::new().classify(&snapshot, &config)
        };

        let aggressive = classify(ClassificationStrategy::Aggressive);
        let comprehensive = classify(ClassificationStrategy::Comprehensive);
        let conservative = classify(ClassificationStrategy::Conservative);

        assert!(aggressive.confidence >= comprehensive.confidence);
        assert!(comprehensive.confidence >= conservative.confidence);
        assert!(aggressive.confidence <= 0.99);
    }
}
