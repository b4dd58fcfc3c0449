//! Pairwise cross-validation between detection subsystems.
//!
//! Agreement comes from small fixed rule tables, not from any generic
//! similarity measure; each pair has its own notion of consistency.

use seedwright_core::{
    ArchitectureType, ClassificationResult, ContentDomain, SchemaSnapshot, scoring,
};

use crate::model::{CrossValidation, FrameworkDetection};
use crate::signals;

/// Neutral agreement when one side of a pair has nothing to say.
const NEUTRAL_AGREEMENT: f64 = 0.5;

/// Compute all pairwise agreements and their mean.
pub fn cross_validate(
    snapshot: &SchemaSnapshot,
    architecture: &ClassificationResult<ArchitectureType>,
    domain: &ClassificationResult<ContentDomain>,
    framework: &FrameworkDetection,
) -> CrossValidation {
    let architecture_framework = architecture_framework_agreement(architecture, framework);
    let schema_architecture = schema_architecture_agreement(snapshot, architecture);
    let domain_architecture =
        domain_architecture_alignment(domain.primary, architecture.primary);

    let overall_agreement = scoring::mean(&[
        architecture_framework,
        schema_architecture,
        domain_architecture,
    ]);

    CrossValidation {
        architecture_framework,
        schema_architecture,
        domain_architecture,
        overall_agreement,
    }
}

/// A framework known to support team accounts agrees with team/hybrid
/// architecture; one that does not agrees with individual.
pub fn architecture_framework_agreement(
    architecture: &ClassificationResult<ArchitectureType>,
    framework: &FrameworkDetection,
) -> f64 {
    if framework.framework.is_none() {
        return NEUTRAL_AGREEMENT;
    }

    match (framework.supports_teams, architecture.primary) {
        (true, ArchitectureType::Team | ArchitectureType::Hybrid) => 0.9,
        (true, ArchitectureType::Individual) => 0.2,
        (false, ArchitectureType::Individual) => 0.8,
        (false, ArchitectureType::Hybrid) => 0.5,
        (false, ArchitectureType::Team) => 0.3,
    }
}

/// The raw snapshot either corroborates or contradicts the architecture
/// verdict through its table vocabulary.
pub fn schema_architecture_agreement(
    snapshot: &SchemaSnapshot,
    architecture: &ClassificationResult<ArchitectureType>,
) -> f64 {
    if snapshot.is_empty() {
        return 0.3;
    }

    let team_tables = signals::team_tables_present(snapshot);
    match (team_tables.is_empty(), architecture.primary) {
        (false, ArchitectureType::Team | ArchitectureType::Hybrid) => 0.9,
        (false, ArchitectureType::Individual) => 0.2,
        (true, ArchitectureType::Individual) => 0.8,
        (true, _) => 0.4,
    }
}

/// Fixed domain×architecture alignment matrix. Doubles as the plausibility
/// hint inside the domain classifier.
pub fn domain_architecture_alignment(
    domain: ContentDomain,
    architecture: ArchitectureType,
) -> f64 {
    match (domain, architecture) {
        (ContentDomain::Saas, ArchitectureType::Team) => 0.9,
        (ContentDomain::Saas, ArchitectureType::Hybrid) => 0.8,
        (ContentDomain::Saas, ArchitectureType::Individual) => 0.4,
        (ContentDomain::Ecommerce, ArchitectureType::Individual) => 0.8,
        (ContentDomain::Ecommerce, ArchitectureType::Hybrid) => 0.6,
        (ContentDomain::Ecommerce, ArchitectureType::Team) => 0.4,
        (ContentDomain::Social, ArchitectureType::Individual) => 0.9,
        (ContentDomain::Social, ArchitectureType::Hybrid) => 0.6,
        (ContentDomain::Social, ArchitectureType::Team) => 0.3,
        (ContentDomain::Outdoor, ArchitectureType::Individual) => 0.7,
        (ContentDomain::Outdoor, ArchitectureType::Hybrid) => 0.6,
        (ContentDomain::Outdoor, ArchitectureType::Team) => 0.4,
        (ContentDomain::Generic, _) => NEUTRAL_AGREEMENT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(primary: ArchitectureType) -> ClassificationResult<ArchitectureType> {
        ClassificationResult::from_ranked(
            vec![(primary, 0.8)],
            Vec::new(),
            Vec::new(),
            false,
            ArchitectureType::Individual,
        )
    }

    #[test]
    fn overall_agreement_is_the_mean_of_the_three() {
        let snapshot = SchemaSnapshot::empty();
        let architecture = result(ArchitectureType::Individual);
        let domain = ClassificationResult::from_ranked(
            vec![(ContentDomain::Social, 0.7)],
            Vec::new(),
            Vec::new(),
            false,
            ContentDomain::Generic,
        );
        let framework = FrameworkDetection::unknown();

        let validation = cross_validate(&snapshot, &architecture, &domain, &framework);
        let expected = (validation.architecture_framework
            + validation.schema_architecture
            + validation.domain_architecture)
            / 3.0;
        assert!((validation.overall_agreement - expected).abs() < 1e-9);
    }

    #[test]
    fn team_framework_agrees_with_team_architecture() {
        let framework = FrameworkDetection {
            framework: Some("makerkit".to_string()),
            confidence: 0.9,
            supports_teams: true,
            version: None,
        };
        assert!(
            architecture_framework_agreement(&result(ArchitectureType::Team), &framework) > 0.8
        );
        assert!(
            architecture_framework_agreement(&result(ArchitectureType::Individual), &framework)
                < 0.3
        );
    }

    #[test]
    fn missing_framework_is_neutral() {
        let framework = FrameworkDetection::unknown();
        assert_eq!(
            architecture_framework_agreement(&result(ArchitectureType::Team), &framework),
            NEUTRAL_AGREEMENT
        );
    }
}
