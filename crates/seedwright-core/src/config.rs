use serde::{Deserialize, Serialize};

use crate::classify::{ArchitectureType, ContentDomain};
use crate::fingerprint::config_fingerprint;

/// Strategy used by the architecture and domain classifiers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationStrategy {
    /// Score every label and keep the ranked list.
    #[default]
    Comprehensive,
    /// Score only the most distinctive signals, discounting the result.
    Fast,
    /// Prefer the generic baseline unless the top score is strong.
    Conservative,
    /// Boost the top result, capped below certainty.
    Aggressive,
}

impl ClassificationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassificationStrategy::Comprehensive => "comprehensive",
            ClassificationStrategy::Fast => "fast",
            ClassificationStrategy::Conservative => "conservative",
            ClassificationStrategy::Aggressive => "aggressive",
        }
    }
}

/// Options that control how detection behaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub strategy: ClassificationStrategy,
    /// Keep runners-up that clear the moderate threshold.
    pub detect_secondary: bool,
    /// Bypass architecture scoring with a fixed answer.
    pub manual_architecture: Option<ArchitectureType>,
    /// Bypass domain scoring with a fixed answer.
    pub manual_domain: Option<ContentDomain>,
    /// Hard deadline for a full detection run, enforced by the integrator.
    pub max_execution_time_ms: Option<u64>,
    /// TTL for cached detection results, in seconds.
    pub cache_ttl_secs: u64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            strategy: ClassificationStrategy::Comprehensive,
            detect_secondary: true,
            manual_architecture: None,
            manual_domain: None,
            max_execution_time_ms: None,
            cache_ttl_secs: 300,
        }
    }
}

impl DetectionConfig {
    /// Fingerprint the fields that affect detection output, for cache keys.
    pub fn fingerprint(&self) -> String {
        let architecture = self
            .manual_architecture
            .map(|value| value.as_str())
            .unwrap_or("auto");
        let domain = self
            .manual_domain
            .map(|value| value.as_str())
            .unwrap_or("auto");
        config_fingerprint(&[
            self.strategy.as_str(),
            if self.detect_secondary { "1" } else { "0" },
            architecture,
            domain,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_tracks_strategy() {
        let base = DetectionConfig::default();
        let fast = DetectionConfig {
            strategy: ClassificationStrategy::Fast,
            ..DetectionConfig::default()
        };
        assert_ne!(base.fingerprint(), fast.fingerprint());
    }

    #[test]
    fn fingerprint_ignores_deadline() {
        let base = DetectionConfig::default();
        let bounded = DetectionConfig {
            max_execution_time_ms: Some(2_000),
            ..DetectionConfig::default()
        };
        assert_eq!(base.fingerprint(), bounded.fingerprint());
    }
}
