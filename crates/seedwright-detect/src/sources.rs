use async_trait::async_trait;

use seedwright_core::{Result, SchemaSnapshot};

use crate::model::FrameworkDetection;

/// Trait implemented by the external schema introspector.
///
/// The engine never enumerates tables or columns itself; it consumes
/// whatever snapshot this source delivers.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    async fn snapshot(&self) -> Result<SchemaSnapshot>;
}

/// Trait implemented by the external framework detector.
#[async_trait]
pub trait FrameworkDetector: Send + Sync {
    async fn detect(&self, snapshot: &SchemaSnapshot) -> Result<FrameworkDetection>;
}
