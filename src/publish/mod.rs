//! Artifact publishing: local folders or S3-compatible object storage.

pub mod local;
pub mod s3;
pub mod sigv4;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use postergrid_common::Result;

use crate::config::StorageConfig;
use crate::encode::{ArtifactSet, Staging};
use crate::report::PublishedArtifacts;

pub use local::LocalPublisher;
pub use s3::S3Publisher;

/// Destination for encoded artifact sets.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Short identifier for logs (`"local"`, `"s3"`).
    fn name(&self) -> &'static str;

    /// Whether references are remote URLs rather than local paths.
    fn is_remote(&self) -> bool;

    /// Where the encoder should write a device's files.
    fn staging(&self) -> Result<Staging>;

    /// Persist `set` and return a reference per stored artifact.
    ///
    /// Individual failures are recorded in the result, never returned.
    async fn publish(&self, set: ArtifactSet) -> PublishedArtifacts;
}

/// Pick the publisher for the resolved storage settings.
pub fn from_config(storage: &StorageConfig, output_dir: &Path) -> Result<Arc<dyn Publisher>> {
    if storage.enabled {
        Ok(Arc::new(S3Publisher::new(storage.clone())?))
    } else {
        Ok(Arc::new(LocalPublisher::new(output_dir)))
    }
}

/// Report skeleton carrying the set's device and encode statistics.
pub(crate) fn published_for(set: &ArtifactSet) -> PublishedArtifacts {
    PublishedArtifacts {
        device: set.device.clone(),
        references: Default::default(),
        target_kb: set.stats.target_kb,
        jpeg_quality: set.stats.jpeg_quality,
        webp_quality: set.stats.webp_quality,
        skips: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_storage_publishes_locally() {
        let publisher = from_config(&StorageConfig::default(), Path::new("./out")).unwrap();
        assert_eq!(publisher.name(), "local");
        assert!(!publisher.is_remote());
    }

    #[test]
    fn enabled_storage_publishes_to_s3() {
        let storage = StorageConfig {
            enabled: true,
            bucket: "walls".into(),
            access_key_id: "AKID".into(),
            secret_access_key: "secret".into(),
            ..StorageConfig::default()
        };
        let publisher = from_config(&storage, Path::new("./out")).unwrap();
        assert_eq!(publisher.name(), "s3");
        assert!(publisher.is_remote());
        assert!(publisher.staging().unwrap().is_temporary());
    }
}
