//! Where encoded artifacts are written before publishing.
//!
//! Local publishing writes straight into the final directory tree
//! `{root}/{original,jpeg,webp}/{stem}.{ext}`. Remote publishing writes into
//! a per-device temporary directory that disappears once the set is dropped.

use std::path::{Path, PathBuf};

use postergrid_common::{ArtifactFormat, Result};

#[derive(Debug)]
pub enum Staging {
    /// Final local output tree.
    Local { root: PathBuf },
    /// Scratch directory for files that will be uploaded.
    Temp(tempfile::TempDir),
}

impl Staging {
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::Local { root: root.into() }
    }

    pub fn temp() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("postergrid-").tempdir()?;
        Ok(Self::Temp(dir))
    }

    pub fn root(&self) -> &Path {
        match self {
            Self::Local { root } => root,
            Self::Temp(dir) => dir.path(),
        }
    }

    /// Create whatever directories [`path_for`](Self::path_for) needs.
    pub fn prepare(&self) -> Result<()> {
        match self {
            Self::Local { root } => {
                for format in ArtifactFormat::ALL {
                    std::fs::create_dir_all(root.join(format.dir_name()))?;
                }
            }
            Self::Temp(_) => {}
        }
        Ok(())
    }

    pub fn path_for(&self, stem: &str, format: ArtifactFormat) -> PathBuf {
        match self {
            Self::Local { root } => root
                .join(format.dir_name())
                .join(format!("{stem}.{}", format.extension())),
            Self::Temp(dir) => {
                let name = match format {
                    ArtifactFormat::Original => format!("{stem}_original.png"),
                    other => format!("{stem}.{}", other.extension()),
                };
                dir.path().join(name)
            }
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temp(_))
    }
}
