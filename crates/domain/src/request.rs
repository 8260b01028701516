//! Code generation requests.

use std::fmt;
use std::sync::Arc;

use crate::error::GenerationResult;
use crate::id::RequestId;
use crate::language::LanguageDefinition;

/// Single-shot completion handler for a [`CodeGenerationRequest`].
pub type CodeGeneratorCallback = Box<dyn FnOnce(GenerationResult) + Send + 'static>;

/// An immutable request to generate code for one serialized workspace.
///
/// The callback can only be consumed through [`CodeGenerationRequest::complete`],
/// which takes the request by value, so it fires at most once. Dropping the
/// request without completing it discards the callback unfired.
pub struct CodeGenerationRequest {
    id: RequestId,
    workspace_content: String,
    language: Arc<LanguageDefinition>,
    block_definitions: Vec<String>,
    generator_scripts: Vec<String>,
    callback: CodeGeneratorCallback,
}

impl CodeGenerationRequest {
    /// Creates a new request.
    ///
    /// # Arguments
    ///
    /// * `workspace_content` - Serialized workspace markup
    /// * `language` - Target language definition
    /// * `block_definitions` - Block-definition resources used by the workspace
    /// * `generator_scripts` - Generator resources to load in addition to the
    ///   language's own required scripts
    /// * `callback` - Invoked once with the generated code or a failure
    pub fn new<F>(
        workspace_content: impl Into<String>,
        language: Arc<LanguageDefinition>,
        block_definitions: impl IntoIterator<Item = impl Into<String>>,
        generator_scripts: impl IntoIterator<Item = impl Into<String>>,
        callback: F,
    ) -> Self
    where
        F: FnOnce(GenerationResult) + Send + 'static,
    {
        Self {
            id: RequestId::new(),
            workspace_content: workspace_content.into(),
            language,
            block_definitions: dedup(block_definitions),
            generator_scripts: dedup(generator_scripts),
            callback: Box::new(callback),
        }
    }

    /// Returns the request identifier.
    #[must_use]
    pub const fn id(&self) -> RequestId {
        self.id
    }

    /// Returns the serialized workspace.
    #[must_use]
    pub fn workspace_content(&self) -> &str {
        &self.workspace_content
    }

    /// Returns the target language.
    #[must_use]
    pub fn language(&self) -> &LanguageDefinition {
        &self.language
    }

    /// Returns the block-definition resources.
    #[must_use]
    pub fn block_definitions(&self) -> &[String] {
        &self.block_definitions
    }

    /// Returns the request's own generator resources.
    #[must_use]
    pub fn generator_scripts(&self) -> &[String] {
        &self.generator_scripts
    }

    /// Returns the language's required scripts followed by the request's
    /// generator scripts, without duplicates.
    #[must_use]
    pub fn all_generator_scripts(&self) -> Vec<String> {
        dedup(
            self.language
                .required_scripts()
                .iter()
                .chain(&self.generator_scripts)
                .cloned(),
        )
    }

    /// Consumes the request and fires its callback.
    pub fn complete(self, result: GenerationResult) {
        (self.callback)(result);
    }
}

impl fmt::Debug for CodeGenerationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeGenerationRequest")
            .field("id", &self.id)
            .field("language", &self.language.name())
            .field("workspace_len", &self.workspace_content.len())
            .field("block_definitions", &self.block_definitions)
            .field("generator_scripts", &self.generator_scripts)
            .finish_non_exhaustive()
    }
}

// Resource sets keep first-seen order.
fn dedup(items: impl IntoIterator<Item = impl Into<String>>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.into();
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
