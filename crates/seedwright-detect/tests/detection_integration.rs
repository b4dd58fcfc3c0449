use async_trait::async_trait;

use seedwright_core::{
    ArchitectureType, ColumnInfo, ConfidenceLevel, DetectionConfig, Error, Result,
    SchemaSnapshot, TableInfo,
};
use seedwright_detect::{
    DetectionIntegrator, FrameworkDetection, FrameworkDetector, SchemaSource,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("seedwright_detect=debug")
        .with_test_writer()
        .try_init();
}

struct FixedSchema(SchemaSnapshot);

#[async_trait]
impl SchemaSource for FixedSchema {
    async fn snapshot(&self) -> Result<SchemaSnapshot> {
        Ok(self.0.clone())
    }
}

struct FailingSchema;

#[async_trait]
impl SchemaSource for FailingSchema {
    async fn snapshot(&self) -> Result<SchemaSnapshot> {
        Err(Error::Db("connection refused".to_string()))
    }
}

struct FixedFramework(FrameworkDetection);

#[async_trait]
impl FrameworkDetector for FixedFramework {
    async fn detect(&self, _snapshot: &SchemaSnapshot) -> Result<FrameworkDetection> {
        Ok(self.0.clone())
    }
}

fn table(name: &str, columns: &[&str]) -> TableInfo {
    TableInfo {
        name: name.to_string(),
        columns: columns
            .iter()
            .map(|column| ColumnInfo {
                name: column.to_string(),
                data_type: "text".to_string(),
                is_nullable: true,
            })
            .collect(),
    }
}

fn team_snapshot() -> SchemaSnapshot {
    SchemaSnapshot {
        tables: vec![
            table("teams", &["id", "name"]),
            table("team_members", &["team_id", "user_id", "role"]),
            table("invitations", &["team_id", "email"]),
            table("users", &["id", "email"]),
        ],
        relationships: Vec::new(),
        integrity_rules: Vec::new(),
    }
}

fn team_framework() -> FrameworkDetection {
    FrameworkDetection {
        framework: Some("makerkit".to_string()),
        confidence: 0.85,
        supports_teams: true,
        version: Some("2.0".to_string()),
    }
}

#[tokio::test]
async fn team_schema_with_team_framework_has_no_conflicts() {
    init_tracing();
    let integrator = DetectionIntegrator::new(
        FixedSchema(team_snapshot()),
        FixedFramework(team_framework()),
        DetectionConfig::default(),
    );

    let result = integrator.detect("postgres://seed@localhost/app").await;

    assert_eq!(result.architecture.primary, ArchitectureType::Team);
    assert!(matches!(
        result.architecture.confidence_level,
        ConfidenceLevel::High | ConfidenceLevel::VeryHigh
    ));
    assert!(result.integration.conflicts.is_empty());
    assert!(result.integration.overall_confidence > 0.6);
}

#[tokio::test]
async fn overall_agreement_is_mean_of_pairwise_scores() {
    let integrator = DetectionIntegrator::new(
        FixedSchema(team_snapshot()),
        FixedFramework(team_framework()),
        DetectionConfig::default(),
    );

    let result = integrator.detect("postgres://seed@localhost/app").await;
    let validation = &result.integration.cross_validation;
    let expected = (validation.architecture_framework
        + validation.schema_architecture
        + validation.domain_architecture)
        / 3.0;
    assert!((validation.overall_agreement - expected).abs() < 1e-9);
}

#[tokio::test]
async fn failed_introspection_degrades_instead_of_failing() {
    init_tracing();
    let integrator = DetectionIntegrator::new(
        FailingSchema,
        FixedFramework(FrameworkDetection::unknown()),
        DetectionConfig::default(),
    );

    let result = integrator.detect("postgres://seed@localhost/app").await;

    assert_eq!(result.schema.table_count, 0);
    assert!(result.integration.overall_confidence < 0.5);
    assert!(
        result
            .integration
            .recommendations
            .iter()
            .any(|note| note.contains("snapshot is empty"))
    );
}

#[tokio::test]
async fn repeated_detection_hits_the_cache() {
    let integrator = DetectionIntegrator::new(
        FixedSchema(team_snapshot()),
        FixedFramework(team_framework()),
        DetectionConfig::default(),
    );

    let first = integrator.detect("postgres://seed@localhost/app").await;
    let second = integrator.detect("postgres://seed@localhost/app").await;

    // Cached results are returned as-is, including stage timings.
    assert_eq!(
        first.integration.performance.total_ms,
        second.integration.performance.total_ms
    );
    assert_eq!(first.schema.fingerprint, second.schema.fingerprint);
}

#[tokio::test]
async fn manual_override_is_reported_in_recommendations() {
    let config = DetectionConfig {
        manual_architecture: Some(ArchitectureType::Hybrid),
        ..DetectionConfig::default()
    };
    let integrator = DetectionIntegrator::new(
        FixedSchema(team_snapshot()),
        FixedFramework(team_framework()),
        config,
    );

    let result = integrator.detect("postgres://seed@localhost/app").await;

    assert_eq!(result.architecture.primary, ArchitectureType::Hybrid);
    assert_eq!(result.architecture.confidence, 0.95);
    assert!(
        result
            .integration
            .recommendations
            .iter()
            .any(|note| note.contains("manual override"))
    );
}
