//! Resource loader port

use async_trait::async_trait;

/// Error type for resource fetching.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// No resource exists under the identifier.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The resource exists but is not UTF-8 text.
    #[error("Resource is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    /// IO error while reading the resource.
    #[error("IO error reading {resource}: {source}")]
    Io {
        /// Identifier of the resource being read.
        resource: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Port for fetching block-definition and generator resources by identifier.
///
/// Identifiers are opaque to the application layer; adapters decide how to
/// resolve them (asset directory, embedded bundle, network).
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Fetches the text content of a resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource does not exist or cannot be read.
    async fn fetch(&self, resource: &str) -> Result<String, ResourceError>;
}
