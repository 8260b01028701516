//! Target language descriptors.
//!
//! A [`LanguageDefinition`] names a target language, the generator namespace
//! the engine must invoke for it, and the generator resources the engine
//! needs before that namespace exists.

use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::error::{DomainError, DomainResult};

/// Static descriptor of a code generation target.
///
/// Definitions compare by name only: two descriptors with the same name
/// describe the same target even when built separately.
#[derive(Debug, Clone)]
pub struct LanguageDefinition {
    name: String,
    generator_namespace: String,
    required_scripts: Vec<String>,
}

impl LanguageDefinition {
    /// Creates a new language definition.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        generator_namespace: impl Into<String>,
        required_scripts: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            generator_namespace: generator_namespace.into(),
            required_scripts: required_scripts.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the language name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the engine-side generator symbol, e.g. `Blockly.JavaScript`.
    #[must_use]
    pub fn generator_namespace(&self) -> &str {
        &self.generator_namespace
    }

    /// Returns the generator resources that must be loaded for this language.
    #[must_use]
    pub fn required_scripts(&self) -> &[String] {
        &self.required_scripts
    }

    /// Returns the shared JavaScript definition.
    #[must_use]
    pub fn javascript() -> Arc<Self> {
        Arc::clone(&JAVASCRIPT)
    }

    /// Returns the shared Python definition.
    #[must_use]
    pub fn python() -> Arc<Self> {
        Arc::clone(&PYTHON)
    }

    /// Returns the shared Lua definition.
    #[must_use]
    pub fn lua() -> Arc<Self> {
        Arc::clone(&LUA)
    }

    /// Returns the shared PHP definition.
    #[must_use]
    pub fn php() -> Arc<Self> {
        Arc::clone(&PHP)
    }

    /// Returns the shared Dart definition.
    #[must_use]
    pub fn dart() -> Arc<Self> {
        Arc::clone(&DART)
    }

    /// Returns every built-in definition.
    #[must_use]
    pub fn builtins() -> Vec<Arc<Self>> {
        vec![
            Self::javascript(),
            Self::python(),
            Self::lua(),
            Self::php(),
            Self::dart(),
        ]
    }

    /// Looks up a built-in definition by name, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownLanguage`] if no built-in matches.
    pub fn builtin(name: &str) -> DomainResult<Arc<Self>> {
        Self::builtins()
            .into_iter()
            .find(|lang| lang.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| DomainError::UnknownLanguage(name.to_string()))
    }
}

impl PartialEq for LanguageDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for LanguageDefinition {}

impl std::hash::Hash for LanguageDefinition {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for LanguageDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

static JAVASCRIPT: LazyLock<Arc<LanguageDefinition>> = LazyLock::new(|| {
    Arc::new(LanguageDefinition::new(
        "javascript",
        "Blockly.JavaScript",
        ["generators/javascript.json"],
    ))
});

static PYTHON: LazyLock<Arc<LanguageDefinition>> = LazyLock::new(|| {
    Arc::new(LanguageDefinition::new(
        "python",
        "Blockly.Python",
        ["generators/python.json"],
    ))
});

static LUA: LazyLock<Arc<LanguageDefinition>> = LazyLock::new(|| {
    Arc::new(LanguageDefinition::new(
        "lua",
        "Blockly.Lua",
        ["generators/lua.json"],
    ))
});

static PHP: LazyLock<Arc<LanguageDefinition>> = LazyLock::new(|| {
    Arc::new(LanguageDefinition::new(
        "php",
        "Blockly.PHP",
        ["generators/php.json"],
    ))
});

static DART: LazyLock<Arc<LanguageDefinition>> = LazyLock::new(|| {
    Arc::new(LanguageDefinition::new(
        "dart",
        "Blockly.Dart",
        ["generators/dart.json"],
    ))
});
