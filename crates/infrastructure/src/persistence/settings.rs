//! Bridge settings persistence.
//!
//! Settings live in a single JSON file. Keys left out of the file take their
//! defaults, and a missing file yields default settings.

use std::path::Path;

use blockgen_domain::BridgeSettings;
use tokio::fs;
use tracing::debug;

use crate::serialization::{SerializationError, from_json_bytes};

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),
}

/// Loads settings from `path`.
///
/// Returns default settings if the file doesn't exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub async fn load_settings(path: &Path) -> Result<BridgeSettings, SettingsError> {
    let content = match fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no settings file; using defaults");
            return Ok(BridgeSettings::default());
        }
        Err(e) => return Err(e.into()),
    };

    let settings = from_json_bytes(&content)?;
    Ok(settings)
}
