//! Rule-based conflict detection between detection subsystems.
//!
//! Each comparator is hard-coded with its own severity and remediation
//! text. Conflicts are data for the caller, never errors.

use seedwright_core::{
    ArchitectureType, ClassificationResult, ConflictSeverity, ConflictType, ContentDomain,
    DetectionConflict, SchemaSnapshot,
};

use crate::model::{FrameworkDetection, SchemaDetectionSummary};
use crate::signals;

/// Confidence at which a subsystem's verdict is treated as asserted.
const CONFIDENT: f64 = 0.6;

/// Run every comparator and collect the conflicts that fire.
pub fn detect_conflicts(
    snapshot: &SchemaSnapshot,
    schema: &SchemaDetectionSummary,
    framework: &FrameworkDetection,
    architecture: &ClassificationResult<ArchitectureType>,
    domain: &ClassificationResult<ContentDomain>,
) -> Vec<DetectionConflict> {
    let mut conflicts = Vec::new();

    if framework.confidence >= CONFIDENT
        && framework.supports_teams
        && architecture.primary == ArchitectureType::Individual
        && architecture.confidence >= CONFIDENT
    {
        conflicts.push(DetectionConflict {
            conflict_type: ConflictType::ArchitectureMismatch,
            description: format!(
                "framework '{}' supports team accounts but architecture detected 'individual'",
                framework.framework.as_deref().unwrap_or("unknown")
            ),
            severity: ConflictSeverity::High,
            suggested_resolution:
                "verify team tables were introspected; consider a manual architecture override"
                    .to_string(),
            involved_systems: vec!["framework".to_string(), "architecture".to_string()],
        });
    }

    let team_tables = signals::team_tables_present(snapshot);
    if !team_tables.is_empty() && architecture.primary == ArchitectureType::Individual {
        conflicts.push(DetectionConflict {
            conflict_type: ConflictType::SchemaInconsistency,
            description: format!(
                "team tables {team_tables:?} exist but architecture detected 'individual'"
            ),
            severity: ConflictSeverity::Medium,
            suggested_resolution:
                "inspect whether the team tables are populated; rerun with the comprehensive strategy"
                    .to_string(),
            involved_systems: vec!["schema".to_string(), "architecture".to_string()],
        });
    }

    if framework.confidence >= CONFIDENT && snapshot.is_empty() {
        conflicts.push(DetectionConflict {
            conflict_type: ConflictType::FrameworkMismatch,
            description: "a framework matched but the schema snapshot is empty".to_string(),
            severity: ConflictSeverity::Medium,
            suggested_resolution: "check introspection privileges for the target database"
                .to_string(),
            involved_systems: vec!["framework".to_string(), "schema".to_string()],
        });
    }

    let all_uncertain = schema.confidence < 0.5
        && framework.confidence < 0.5
        && architecture.confidence < 0.5
        && domain.confidence < 0.5;
    if all_uncertain {
        conflicts.push(DetectionConflict {
            conflict_type: ConflictType::SchemaInconsistency,
            description: "no detection subsystem reached 0.5 confidence".to_string(),
            severity: ConflictSeverity::Low,
            suggested_resolution:
                "provide manual overrides or extend the schema before seeding".to_string(),
            involved_systems: vec![
                "schema".to_string(),
                "framework".to_string(),
                "architecture".to_string(),
                "domain".to_string(),
            ],
        });
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedwright_core::{ColumnInfo, TableInfo};

    fn snapshot_with(tables: &[&str]) -> SchemaSnapshot {
        SchemaSnapshot {
            tables: tables
                .iter()
                .map(|name| TableInfo {
                    name: name.to_string(),
                    columns: vec![ColumnInfo {
                        name: "id".to_string(),
                        data_type: "uuid".to_string(),
                        is_nullable: false,
                    }],
                })
                .collect(),
            relationships: Vec::new(),
            integrity_rules: Vec::new(),
        }
    }

    fn summary(confidence: f64) -> SchemaDetectionSummary {
        SchemaDetectionSummary {
            table_count: 1,
            relationship_count: 0,
            integrity_rule_count: 0,
            fingerprint: "0".repeat(16),
            confidence,
        }
    }

    fn architecture(
        primary: ArchitectureType,
        confidence: f64,
    ) -> ClassificationResult<ArchitectureType> {
        ClassificationResult::from_ranked(
            vec![(primary, confidence)],
            Vec::new(),
            Vec::new(),
            false,
            ArchitectureType::Individual,
        )
    }

    fn domain(confidence: f64) -> ClassificationResult<ContentDomain> {
        ClassificationResult::from_ranked(
            vec![(ContentDomain::Generic, confidence)],
            Vec::new(),
            Vec::new(),
            false,
            ContentDomain::Generic,
        )
    }

    #[test]
    fn team_framework_vs_individual_architecture_is_high_severity() {
        let framework = FrameworkDetection {
            framework: Some("makerkit".to_string()),
            confidence: 0.9,
            supports_teams: true,
            version: None,
        };
        let conflicts = detect_conflicts(
            &snapshot_with(&["users"]),
            &summary(0.9),
            &framework,
            &architecture(ArchitectureType::Individual, 0.8),
            &domain(0.6),
        );
        assert!(conflicts.iter().any(|conflict| {
            conflict.conflict_type == ConflictType::ArchitectureMismatch
                && conflict.severity == ConflictSeverity::High
        }));
    }

    #[test]
    fn team_tables_vs_individual_architecture_fires() {
        let conflicts = detect_conflicts(
            &snapshot_with(&["teams", "users"]),
            &summary(0.9),
            &FrameworkDetection::unknown(),
            &architecture(ArchitectureType::Individual, 0.7),
            &domain(0.6),
        );
        assert!(conflicts.iter().any(|conflict| {
            conflict.conflict_type == ConflictType::SchemaInconsistency
        }));
    }

    #[test]
    fn all_subsystems_uncertain_fires_low_severity() {
        let conflicts = detect_conflicts(
            &snapshot_with(&["widgets"]),
            &summary(0.4),
            &FrameworkDetection::unknown(),
            &architecture(ArchitectureType::Individual, 0.4),
            &domain(0.35),
        );
        assert!(conflicts.iter().any(|conflict| {
            conflict.severity == ConflictSeverity::Low
        }));
    }

    #[test]
    fn consistent_detection_yields_no_conflicts() {
        let framework = FrameworkDetection {
            framework: Some("makerkit".to_string()),
            confidence: 0.9,
            supports_teams: true,
            version: None,
        };
        let conflicts = detect_conflicts(
            &snapshot_with(&["teams", "team_members", "users"]),
            &summary(0.9),
            &framework,
            &architecture(ArchitectureType::Team, 0.85),
            &domain(0.6),
        );
        assert!(conflicts.is_empty());
    }
}
