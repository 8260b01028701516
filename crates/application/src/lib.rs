//! Blockgen Application - Engine session host and request queue
//!
//! This crate defines the application layer with:
//! - Port traits (script engine, engine factory, resource loader)
//! - The engine session host ([`CodeGeneratorService`])
//! - The lifecycle-bound FIFO request queue ([`CodeGeneratorManager`])

pub mod manager;
pub mod ports;
pub mod service;

pub use manager::CodeGeneratorManager;
pub use ports::{
    CancellationReceiver, CancellationToken, EngineError, EngineFactory, ResourceError,
    ResourceKind, ResourceLoader, ResultChannel, ResultReceiver, ScriptEngine,
};
pub use service::{
    CodeGeneratorService, EngineHandle, LoadError, LoadErrorKind, ServiceError, SessionState,
};
