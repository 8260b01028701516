//! Blockgen - one-shot code generation
//!
//! Wires the infrastructure adapters into a [`CodeGeneratorManager`] and runs
//! a single request through it, the way the `blockgen` binary does.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use blockgen_application::{CodeGeneratorManager, ServiceError};
use blockgen_domain::{
    BridgeSettings, CodeGenerationRequest, DomainError, GenerationError, LanguageDefinition,
};
use blockgen_infrastructure::{AssetResourceLoader, SettingsError, TemplateEngineFactory};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::info;

/// Errors surfaced by the binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Settings could not be loaded.
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Bad input such as an unknown language.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The engine session could not be started.
    #[error("Engine session error: {0}")]
    Service(#[from] ServiceError),

    /// Generation ran and failed.
    #[error("Generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// The workspace file could not be read.
    #[error("Cannot read {}: {source}", path.display())]
    Workspace {
        /// Path of the workspace file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The request was dropped without a result (deadline passed).
    #[error("Request dropped without a result")]
    Dropped,
}

/// One generation to run.
#[derive(Debug, Clone)]
pub struct GenerationJob {
    /// Serialized workspace.
    pub workspace: String,
    /// Target language.
    pub language: Arc<LanguageDefinition>,
    /// Block-definition resources.
    pub block_definitions: Vec<String>,
    /// Generator resources beyond the language's own.
    pub generator_scripts: Vec<String>,
}

impl GenerationJob {
    /// Creates a job for `workspace` in a built-in language.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownLanguage`] if `language` is not built in.
    pub fn new(workspace: impl Into<String>, language: &str) -> Result<Self, DomainError> {
        Ok(Self {
            workspace: workspace.into(),
            language: LanguageDefinition::builtin(language)?,
            block_definitions: Vec::new(),
            generator_scripts: Vec::new(),
        })
    }

    /// Adds a block-definition resource.
    #[must_use]
    pub fn with_blocks(mut self, resource: impl Into<String>) -> Self {
        self.block_definitions.push(resource.into());
        self
    }

    /// Adds a generator resource.
    #[must_use]
    pub fn with_generator(mut self, resource: impl Into<String>) -> Self {
        self.generator_scripts.push(resource.into());
        self
    }
}

/// Reads a workspace file.
///
/// # Errors
///
/// Returns [`AppError::Workspace`] if the file cannot be read.
pub async fn read_workspace_file(path: &Path) -> Result<String, AppError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| AppError::Workspace {
            path: path.to_path_buf(),
            source,
        })
}

/// Runs one job through a freshly resumed manager and pauses it afterwards.
///
/// # Errors
///
/// Returns an error if the session cannot start, generation fails, or the
/// request is dropped by its deadline.
pub async fn generate_once(
    settings: &BridgeSettings,
    job: GenerationJob,
) -> Result<String, AppError> {
    let manager = CodeGeneratorManager::new(
        Handle::current(),
        TemplateEngineFactory::from_settings(settings),
        Arc::new(AssetResourceLoader::new(&settings.asset_root)),
    )
    .with_generation_timeout(settings.generation_timeout());
    manager.on_resume()?;

    info!(
        language = %job.language,
        tier = %settings.escaping_tier(),
        assets = %settings.asset_root.display(),
        "generating"
    );

    let (tx, rx) = oneshot::channel();
    manager.request_code_generation(CodeGenerationRequest::new(
        job.workspace,
        job.language,
        job.block_definitions,
        job.generator_scripts,
        move |result| {
            let _ = tx.send(result);
        },
    ));

    let outcome = rx.await;
    manager.on_pause();

    let code = outcome.map_err(|_| AppError::Dropped)??;
    Ok(code)
}
