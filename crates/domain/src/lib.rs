//! Blockgen Domain - Core code generation types
//!
//! This crate defines the domain model for the Blockgen code generation bridge.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod escaping;
pub mod id;
pub mod language;
pub mod request;
pub mod settings;

pub use error::{DomainError, DomainResult, GenerationError, GenerationResult};
pub use escaping::{COMMAND_PREFIX, EngineCommand, EscapingTier, INVOKE_FUNCTION};
pub use id::RequestId;
pub use language::LanguageDefinition;
pub use request::{CodeGenerationRequest, CodeGeneratorCallback};
pub use settings::BridgeSettings;
