//! Blockgen Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod engine;
pub mod persistence;
pub mod serialization;

pub use engine::{
    BlockCatalog, BlockDefinition, GeneratorDefinition, TemplateEngineFactory,
    TemplateScriptEngine, WorkspaceBlock, read_workspace,
};
pub use persistence::{AssetResourceLoader, SettingsError, load_settings};
pub use serialization::{SerializationError, from_json, from_json_bytes};
