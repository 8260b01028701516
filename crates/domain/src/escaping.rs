//! Engine command encoding.
//!
//! Workspace content reaches the engine embedded in a command string of the
//! form `javascript:invoke('<ENCODED>', <NAMESPACE>);`. How `<ENCODED>` is
//! produced depends on the engine's compatibility tier:
//!
//! - [`EscapingTier::Modern`] engines evaluate the command as script, so the
//!   content sits inside a single-quoted literal and only `'` is escaped.
//! - [`EscapingTier::Legacy`] engines treat the command as a navigation
//!   address, so the content is fully percent-encoded (`%20` for spaces,
//!   never `+`).
//!
//! The generator namespace is a trusted identifier and is emitted verbatim.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Prefix every engine command starts with.
pub const COMMAND_PREFIX: &str = "javascript:";

/// Engine-side entry point invoked by every command.
pub const INVOKE_FUNCTION: &str = "invoke";

/// Compatibility class of the embedded engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapingTier {
    /// Engine evaluates commands as script source.
    #[default]
    Modern,
    /// Engine parses commands as navigation addresses.
    Legacy,
}

impl EscapingTier {
    /// Selects the tier from the host's legacy-engine capability flag.
    #[must_use]
    pub const fn from_legacy_flag(legacy_engine: bool) -> Self {
        if legacy_engine { Self::Legacy } else { Self::Modern }
    }

    /// Encodes workspace content for embedding in a command.
    ///
    /// Encoding is total: every string has a representation in both tiers.
    #[must_use]
    pub fn encode(self, content: &str) -> String {
        match self {
            Self::Modern => content.replace('\'', "\\'"),
            Self::Legacy => urlencoding::encode(content).into_owned(),
        }
    }

    /// Reverses [`EscapingTier::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidEncoding`] if legacy input percent-decodes
    /// to bytes that are not valid UTF-8. Output of `encode` never fails.
    pub fn decode(self, encoded: &str) -> DomainResult<String> {
        match self {
            Self::Modern => Ok(unescape_quotes(encoded)),
            Self::Legacy => urlencoding::decode(encoded)
                .map(Cow::into_owned)
                .map_err(|e| DomainError::InvalidEncoding(e.to_string())),
        }
    }

    /// Builds the full engine command for `content` and `generator_namespace`.
    #[must_use]
    pub fn build_command(self, content: &str, generator_namespace: &str) -> String {
        format!(
            "{COMMAND_PREFIX}{INVOKE_FUNCTION}('{}', {generator_namespace});",
            self.encode(content)
        )
    }

    /// Parses a command produced by [`EscapingTier::build_command`] back into
    /// its content and namespace.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::MalformedCommand`] if the command does not have
    /// the expected shape, or [`DomainError::InvalidEncoding`] if the embedded
    /// content cannot be decoded.
    pub fn parse_command(self, command: &str) -> DomainResult<EngineCommand> {
        let malformed = || DomainError::MalformedCommand(truncate(command));

        let body = command
            .strip_prefix(COMMAND_PREFIX)
            .and_then(|rest| rest.strip_prefix(INVOKE_FUNCTION))
            .and_then(|rest| rest.strip_prefix("('"))
            .and_then(|rest| rest.strip_suffix(");"))
            .ok_or_else(malformed)?;

        // Encoded content never holds an unescaped quote, and the namespace
        // never holds one at all, so the last `', ` is the separator.
        let split = body.rfind("', ").ok_or_else(malformed)?;
        let (encoded, namespace) = (&body[..split], body[split + 3..].trim());
        if namespace.is_empty() || namespace.contains('\'') {
            return Err(malformed());
        }

        Ok(EngineCommand {
            content: self.decode(encoded)?,
            generator_namespace: namespace.to_string(),
        })
    }
}

impl fmt::Display for EscapingTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Modern => write!(f, "modern"),
            Self::Legacy => write!(f, "legacy"),
        }
    }
}

/// A decoded engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    /// The original workspace content.
    pub content: String,
    /// The generator namespace to invoke.
    pub generator_namespace: String,
}

fn unescape_quotes(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut chars = encoded.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&'\'') {
            continue;
        }
        out.push(c);
    }
    out
}

fn truncate(command: &str) -> String {
    command.chars().take(64).collect()
}
