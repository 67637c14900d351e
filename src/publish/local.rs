use std::path::{Path, PathBuf};

use async_trait::async_trait;
use postergrid_common::Result;
use tracing::info;

use super::{published_for, Publisher};
use crate::encode::{ArtifactSet, Staging};
use crate::report::PublishedArtifacts;

/// Leaves artifacts in `{root}/{original,jpeg,webp}/` and reports their paths.
#[derive(Debug, Clone)]
pub struct LocalPublisher {
    root: PathBuf,
}

impl LocalPublisher {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl Publisher for LocalPublisher {
    fn name(&self) -> &'static str {
        "local"
    }

    fn is_remote(&self) -> bool {
        false
    }

    fn staging(&self) -> Result<Staging> {
        Ok(Staging::local(&self.root))
    }

    async fn publish(&self, set: ArtifactSet) -> PublishedArtifacts {
        let mut published = published_for(&set);
        for (format, file) in &set.files {
            published
                .references
                .insert(*format, file.path.display().to_string());
        }
        info!(
            device = %set.device,
            files = published.references.len(),
            root = %self.root.display(),
            "Saved artifacts"
        );
        published
    }
}
