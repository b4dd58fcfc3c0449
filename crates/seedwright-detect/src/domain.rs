//! Content-domain classification: which business vertical the schema
//! resembles.

use tracing::{debug, warn};

use seedwright_core::{
    ArchitectureType, ClassificationResult, ClassificationStrategy, ContentDomain,
    DetectionConfig, Error, Evidence, Result, SchemaSnapshot, scoring,
};

use crate::architecture::apply_strategy;
use crate::crossval::domain_architecture_alignment;
use crate::signals;

/// Baseline score every schema earns for the generic domain, so an
/// unrecognizable schema still classifies instead of scoring zero.
const GENERIC_BASELINE: f64 = 0.35;

/// Scores a schema snapshot against the fixed set of content domains.
#[derive(Debug, Clone, Default)]
pub struct DomainClassifier;

impl DomainClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify the snapshot. The architecture primary, when known, acts as
    /// a plausibility hint. Never fails; internal errors degrade to the
    /// generic fallback.
    pub fn classify(
        &self,
        snapshot: &SchemaSnapshot,
        config: &DetectionConfig,
        architecture_hint: Option<ArchitectureType>,
    ) -> ClassificationResult<ContentDomain> {
        if let Some(label) = config.manual_domain {
            debug!(domain = label.as_str(), "manual domain override");
            return ClassificationResult::manual_override(label);
        }

        match self.classify_inner(snapshot, config, architecture_hint) {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, "domain classification failed");
                ClassificationResult::fallback(ContentDomain::Generic, err.to_string())
            }
        }
    }

    fn classify_inner(
        &self,
        snapshot: &SchemaSnapshot,
        config: &DetectionConfig,
        architecture_hint: Option<ArchitectureType>,
    ) -> Result<ClassificationResult<ContentDomain>> {
        if snapshot.is_empty() {
            return Err(Error::InvalidSnapshot(
                "snapshot contains no tables".to_string(),
            ));
        }

        let fast = config.strategy == ClassificationStrategy::Fast;
        let mut reasoning = Vec::new();
        let mut all_evidence = Vec::new();
        let mut ranked = Vec::new();

        for domain in ContentDomain::ALL {
            let evidence = score_domain(snapshot, domain, architecture_hint, fast);
            let score = scoring::weighted_confidence(&evidence);
            if score > 0.0 {
                reasoning.push(format!("{}: {:.2}", domain.as_str(), score));
            }
            all_evidence.extend(evidence);
            ranked.push((domain, score));
        }

        if let Some(hint) = architecture_hint {
            reasoning.push(format!(
                "architecture hint '{}' applied to domain plausibility",
                hint.as_str()
            ));
        }

        let result = ClassificationResult::from_ranked(
            ranked,
            all_evidence,
            reasoning,
            config.detect_secondary,
            ContentDomain::Generic,
        );

        Ok(apply_strategy(result, config.strategy, ContentDomain::Generic))
    }
}

fn score_domain(
    snapshot: &SchemaSnapshot,
    domain: ContentDomain,
    architecture_hint: Option<ArchitectureType>,
    fast: bool,
) -> Vec<Evidence> {
    let mut evidence = Vec::new();

    if domain == ContentDomain::Generic {
        evidence.push(Evidence::new(
            "baseline",
            "generic baseline",
            GENERIC_BASELINE,
            1.0,
        ));
        return evidence;
    }

    let matches = signals::domain_tables_present(snapshot, domain);
    for table in &matches {
        evidence.push(Evidence::new(
            "table_name",
            format!("{} table '{table}' present", domain.as_str()),
            0.8,
            1.0,
        ));
    }

    // Three or more vocabulary hits make the vertical unambiguous.
    if matches.len() >= 3 {
        evidence.push(Evidence::new(
            "table_name",
            format!("{} vocabulary coverage ({} tables)", domain.as_str(), matches.len()),
            0.95,
            2.0,
        ));
    }

    if !fast
        && !matches.is_empty()
        && let Some(hint) = architecture_hint
    {
        evidence.push(Evidence::new(
            "architecture_hint",
            format!(
                "{} plausibility under '{}' architecture",
                domain.as_str(),
                hint.as_str()
            ),
            domain_architecture_alignment(domain, hint),
            0.5,
        ));
    }

    evidence
}
