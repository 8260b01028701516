//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur while encoding or parsing engine commands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Encoded content could not be decoded back into UTF-8 text.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A command string does not have the `invoke('…', NAMESPACE);` shape.
    #[error("malformed engine command: {0}")]
    MalformedCommand(String),

    /// No language definition matches the given name.
    #[error("unknown language: {0}")]
    UnknownLanguage(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// Why a code generation request finished without generated code.
///
/// This is what a request's callback receives on failure. Lifecycle drops
/// never reach the callback, so they have no variant here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerationError {
    /// A block-definition or generator-script resource failed to fetch or parse.
    #[error("failed to load resource `{resource}`: {reason}")]
    ResourceLoad {
        /// Identifier of the resource that failed.
        resource: String,
        /// Human readable cause.
        reason: String,
    },

    /// The engine accepted the command but reported a failure.
    #[error("engine error: {0}")]
    Engine(String),
}

/// Outcome delivered to a request's callback.
pub type GenerationResult = Result<String, GenerationError>;
