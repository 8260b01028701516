//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod cancellation;
mod resource_loader;
mod script_engine;

pub use cancellation::{CancellationReceiver, CancellationToken};
pub use resource_loader::{ResourceError, ResourceLoader};
pub use script_engine::{
    EngineError, EngineFactory, ResourceKind, ResultChannel, ResultReceiver, ScriptEngine,
};
