//! Resource loader backed by an asset directory.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use blockgen_application::ports::{ResourceError, ResourceLoader};
use tokio::fs;
use tracing::debug;

/// Resolves resource identifiers as relative paths under an asset root,
/// reading them with `tokio::fs`.
///
/// Identifiers use `/` separators (`default/test_blocks.json`). Absolute
/// identifiers and identifiers that climb out of the root do not resolve.
#[derive(Debug, Clone)]
pub struct AssetResourceLoader {
    root: PathBuf,
}

impl AssetResourceLoader {
    /// Creates a loader rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, resource: &str) -> Result<PathBuf, ResourceError> {
        let relative = Path::new(resource);
        let contained = !resource.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        if !contained {
            return Err(ResourceError::NotFound(resource.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ResourceLoader for AssetResourceLoader {
    async fn fetch(&self, resource: &str) -> Result<String, ResourceError> {
        let path = self.resolve(resource)?;
        let bytes = fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(resource.to_string())
            } else {
                ResourceError::Io {
                    resource: resource.to_string(),
                    source: e,
                }
            }
        })?;
        debug!(resource, path = %path.display(), bytes = bytes.len(), "asset read");

        String::from_utf8(bytes).map_err(|_| ResourceError::InvalidUtf8(resource.to_string()))
    }
}
