//! Detection integrator: one unified, weighted-confidence verdict.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use seedwright_core::{
    ArchitectureType, ClassificationResult, ContentDomain, DetectionConfig, SchemaSnapshot,
    TtlCache, redact_connection_string, schema_fingerprint, scoring,
};

use crate::architecture::ArchitectureClassifier;
use crate::conflicts::detect_conflicts;
use crate::crossval::cross_validate;
use crate::domain::DomainClassifier;
use crate::model::{
    CrossValidation, DetectionPerformance, FrameworkDetection, IntegrationSummary,
    SchemaDetectionSummary, UnifiedDetectionResult,
};
use crate::sources::{FrameworkDetector, SchemaSource};

/// Weights of the overall-confidence sum. They total 1.0; the result is
/// clamped anyway so a future reweighting cannot overflow the unit range.
const WEIGHT_SCHEMA: f64 = 0.2;
const WEIGHT_FRAMEWORK: f64 = 0.2;
const WEIGHT_ARCHITECTURE: f64 = 0.25;
const WEIGHT_DOMAIN: f64 = 0.2;
const WEIGHT_CROSS_VALIDATION: f64 = 0.15;

/// Completeness confidence assigned to a non-empty snapshot.
const SCHEMA_CONFIDENCE_PRESENT: f64 = 0.9;
/// Completeness confidence assigned to an empty/failed snapshot.
const SCHEMA_CONFIDENCE_EMPTY: f64 = 0.2;

type DetectionCacheKey = (String, String, String);

/// Runs the full detection pipeline and integrates the results.
///
/// Sub-detector failures degrade to defaults; the integrator itself never
/// fails. Results are cached by `(database_url, schema fingerprint, config
/// fingerprint)` for the configured TTL.
pub struct DetectionIntegrator<S, F> {
    schema_source: S,
    framework_detector: F,
    architecture: ArchitectureClassifier,
    domain: DomainClassifier,
    config: DetectionConfig,
    cache: TtlCache<DetectionCacheKey, UnifiedDetectionResult>,
}

impl<S: SchemaSource, F: FrameworkDetector> DetectionIntegrator<S, F> {
    pub fn new(schema_source: S, framework_detector: F, config: DetectionConfig) -> Self {
        let cache = TtlCache::new(Duration::from_secs(config.cache_ttl_secs));
        Self {
            schema_source,
            framework_detector,
            architecture: ArchitectureClassifier::new(),
            domain: DomainClassifier::new(),
            config,
            cache,
        }
    }

    /// Drop every cached detection result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Detect and integrate. When `max_execution_time_ms` is configured it
    /// is enforced as a hard deadline; on expiry a degraded low-confidence
    /// result is returned rather than an error.
    pub async fn detect(&self, database_url: &str) -> UnifiedDetectionResult {
        match self.config.max_execution_time_ms {
            Some(ms) => {
                let deadline = Duration::from_millis(ms);
                match tokio::time::timeout(deadline, self.run(database_url)).await {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(
                            database = %redact_connection_string(database_url),
                            deadline_ms = ms,
                            "detection deadline exceeded"
                        );
                        self.degraded_result(ms)
                    }
                }
            }
            None => self.run(database_url).await,
        }
    }

    async fn run(&self, database_url: &str) -> UnifiedDetectionResult {
        let total_start = Instant::now();
        let mut performance = DetectionPerformance::default();

        let stage = Instant::now();
        let snapshot = match self.schema_source.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "schema introspection failed, using empty snapshot");
                SchemaSnapshot::empty()
            }
        };
        performance.schema_ms = stage.elapsed().as_millis() as u64;

        let fingerprint = schema_fingerprint(&snapshot);
        let cache_key = (
            database_url.to_string(),
            fingerprint.clone(),
            self.config.fingerprint(),
        );
        if let Some(cached) = self.cache.get(&cache_key) {
            debug!(fingerprint = %fingerprint, "detection cache hit");
            return cached;
        }

        let stage = Instant::now();
        let framework = match self.framework_detector.detect(&snapshot).await {
            Ok(framework) => framework,
            Err(err) => {
                warn!(error = %err, "framework detection failed, using unknown");
                FrameworkDetection::unknown()
            }
        };
        performance.framework_ms = stage.elapsed().as_millis() as u64;

        let stage = Instant::now();
        let architecture = self.architecture.classify(&snapshot, &self.config);
        performance.architecture_ms = stage.elapsed().as_millis() as u64;

        let stage = Instant::now();
        let domain =
            self.domain
                .classify(&snapshot, &self.config, Some(architecture.primary));
        performance.domain_ms = stage.elapsed().as_millis() as u64;

        let stage = Instant::now();
        let schema_summary = SchemaDetectionSummary {
            table_count: snapshot.tables.len(),
            relationship_count: snapshot.relationships.len(),
            integrity_rule_count: snapshot.integrity_rules.len(),
            fingerprint: fingerprint.clone(),
            confidence: if snapshot.is_empty() {
                SCHEMA_CONFIDENCE_EMPTY
            } else {
                SCHEMA_CONFIDENCE_PRESENT
            },
        };

        let cross_validation = cross_validate(&snapshot, &architecture, &domain, &framework);
        let conflicts = detect_conflicts(
            &snapshot,
            &schema_summary,
            &framework,
            &architecture,
            &domain,
        );
        let overall_confidence = overall_confidence(
            &schema_summary,
            &framework,
            architecture.confidence,
            domain.confidence,
            &cross_validation,
        );
        let recommendations = recommendations(
            &self.config,
            &snapshot,
            overall_confidence,
            conflicts.len(),
        );
        performance.integration_ms = stage.elapsed().as_millis() as u64;
        performance.total_ms = total_start.elapsed().as_millis() as u64;

        info!(
            database = %redact_connection_string(database_url),
            architecture = architecture.primary.as_str(),
            domain = domain.primary.as_str(),
            overall_confidence,
            conflicts = conflicts.len(),
            duration_ms = performance.total_ms,
            "detection completed"
        );

        let result = UnifiedDetectionResult {
            architecture,
            domain,
            framework,
            schema: schema_summary,
            integration: IntegrationSummary {
                overall_confidence,
                cross_validation,
                conflicts,
                recommendations,
                performance,
            },
            detected_at: crate::model::utc_timestamp(),
        };

        self.cache.put(cache_key, result.clone());
        result
    }

    fn degraded_result(&self, deadline_ms: u64) -> UnifiedDetectionResult {
        let architecture = ClassificationResult::fallback(
            ArchitectureType::Individual,
            format!("deadline of {deadline_ms}ms exceeded"),
        );
        let domain = ClassificationResult::fallback(
            ContentDomain::Generic,
            format!("deadline of {deadline_ms}ms exceeded"),
        );
        let framework = FrameworkDetection::unknown();
        let schema = SchemaDetectionSummary {
            table_count: 0,
            relationship_count: 0,
            integrity_rule_count: 0,
            fingerprint: schema_fingerprint(&SchemaSnapshot::empty()),
            confidence: SCHEMA_CONFIDENCE_EMPTY,
        };
        let cross_validation =
            cross_validate(&SchemaSnapshot::empty(), &architecture, &domain, &framework);
        let overall_confidence = overall_confidence(
            &schema,
            &framework,
            architecture.confidence,
            domain.confidence,
            &cross_validation,
        );

        UnifiedDetectionResult {
            architecture,
            domain,
            framework,
            schema,
            integration: IntegrationSummary {
                overall_confidence,
                cross_validation,
                conflicts: Vec::new(),
                recommendations: vec![
                    "detection exceeded its deadline; results are degraded".to_string(),
                ],
                performance: DetectionPerformance {
                    total_ms: deadline_ms,
                    ..DetectionPerformance::default()
                },
            },
            detected_at: crate::model::utc_timestamp(),
        }
    }
}

fn overall_confidence(
    schema: &SchemaDetectionSummary,
    framework: &FrameworkDetection,
    architecture_confidence: f64,
    domain_confidence: f64,
    cross_validation: &CrossValidation,
) -> f64 {
    scoring::clamp_unit(
        WEIGHT_SCHEMA * schema.confidence
            + WEIGHT_FRAMEWORK * framework.confidence
            + WEIGHT_ARCHITECTURE * architecture_confidence
            + WEIGHT_DOMAIN * domain_confidence
            + WEIGHT_CROSS_VALIDATION * cross_validation.overall_agreement,
    )
}

fn recommendations(
    config: &DetectionConfig,
    snapshot: &SchemaSnapshot,
    overall_confidence: f64,
    conflict_count: usize,
) -> Vec<String> {
    let mut notes = Vec::new();
    if snapshot.is_empty() {
        notes.push("schema snapshot is empty; seeding defaults cannot be derived".to_string());
    }
    if overall_confidence < 0.5 {
        notes.push(
            "overall confidence is low; review the schema manually before seeding".to_string(),
        );
    }
    if config.manual_architecture.is_some() || config.manual_domain.is_some() {
        notes.push("manual override in effect; automatic detection was bypassed".to_string());
    }
    if conflict_count > 0 {
        notes.push(format!(
            "resolve {conflict_count} detection conflict(s) before trusting defaults"
        ));
    }
    notes
}
