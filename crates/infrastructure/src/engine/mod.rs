//! Sandboxed template engine.
//!
//! A self-contained [`ScriptEngine`](blockgen_application::ScriptEngine)
//! implementation. Block definitions describe which block types exist and
//! which fields they carry. Generator definitions map each block type to a
//! code template for one generator namespace. Workspaces arrive as block
//! markup inside `invoke(...)` commands and are rendered on a dedicated
//! engine thread.

mod blocks;
mod generator;
mod template_engine;
mod workspace;

pub use blocks::{BlockCatalog, BlockDefinition};
pub use generator::GeneratorDefinition;
pub use template_engine::{TemplateEngineFactory, TemplateScriptEngine};
pub use workspace::{WorkspaceBlock, read_workspace};
