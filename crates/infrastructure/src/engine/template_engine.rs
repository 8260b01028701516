//! Template engine adapter for the script engine port.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc;

use blockgen_application::ports::{
    EngineError, EngineFactory, ResourceKind, ResultChannel, ScriptEngine,
};
use blockgen_domain::{BridgeSettings, EscapingTier};
use parking_lot::RwLock;
use tracing::{debug, info};

use super::blocks::{BlockCatalog, BlockDefinition};
use super::generator::GeneratorDefinition;
use super::workspace::read_workspace;

/// Everything loaded into one engine session.
#[derive(Debug, Default)]
struct Catalog {
    blocks: BlockCatalog,
    generators: HashMap<String, GeneratorDefinition>,
}

impl Catalog {
    fn generate(&self, tier: EscapingTier, command: &str) -> Result<String, EngineError> {
        let command = tier
            .parse_command(command)
            .map_err(|e| EngineError::Rejected(e.to_string()))?;
        let generator = self
            .generators
            .get(&command.generator_namespace)
            .ok_or_else(|| {
                EngineError::Script(format!(
                    "{} is not defined",
                    command.generator_namespace
                ))
            })?;
        let workspace = read_workspace(&command.content)?;
        generator.render(&workspace, &self.blocks)
    }
}

struct Job {
    command: String,
    results: ResultChannel,
}

/// One sandboxed engine session.
///
/// Resources are parsed on the caller's thread. Commands are queued to a
/// dedicated engine thread, which answers each through its result channel.
/// Disposing closes the queue and detaches the thread, which exits once the
/// commands already queued have been answered.
pub struct TemplateScriptEngine {
    tier: EscapingTier,
    catalog: Arc<RwLock<Catalog>>,
    jobs: Option<mpsc::Sender<Job>>,
}

impl TemplateScriptEngine {
    /// Starts an engine session and its engine thread.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Unavailable`] if the thread cannot be spawned.
    pub fn start(tier: EscapingTier) -> Result<Self, EngineError> {
        let catalog = Arc::new(RwLock::new(Catalog::default()));
        let (jobs, queue) = mpsc::channel::<Job>();

        let shared = Arc::clone(&catalog);
        std::thread::Builder::new()
            .name("blockgen-engine".to_string())
            .spawn(move || {
                for job in queue {
                    if job.results.is_closed() {
                        debug!("skipping abandoned command");
                        continue;
                    }
                    let outcome = shared.read().generate(tier, &job.command);
                    let delivered = match outcome {
                        Ok(code) => job.results.deliver(code),
                        Err(error) => {
                            debug!(%error, "generation failed in engine");
                            job.results.fail(error)
                        }
                    };
                    if !delivered {
                        debug!("result arrived after the caller went away");
                    }
                }
            })
            .map_err(|e| EngineError::Unavailable(e.to_string()))?;

        info!(%tier, "template engine started");
        Ok(Self {
            tier,
            catalog,
            jobs: Some(jobs),
        })
    }

    fn is_disposed(&self) -> bool {
        self.jobs.is_none()
    }
}

impl ScriptEngine for TemplateScriptEngine {
    fn tier(&self) -> EscapingTier {
        self.tier
    }

    fn load_resource(
        &mut self,
        kind: ResourceKind,
        name: &str,
        source: &str,
    ) -> Result<(), EngineError> {
        if self.is_disposed() {
            return Err(EngineError::Unavailable("engine disposed".to_string()));
        }
        let reject = |e: EngineError| EngineError::Rejected(format!("{name}: {e}"));

        match kind {
            ResourceKind::BlockDefinitions => {
                let definitions = BlockDefinition::parse_all(source).map_err(reject)?;
                debug!(resource = name, count = definitions.len(), "block definitions installed");
                self.catalog.write().blocks.extend(definitions);
            }
            ResourceKind::GeneratorScript => {
                let generator = GeneratorDefinition::parse(source).map_err(reject)?;
                debug!(
                    resource = name,
                    namespace = generator.namespace(),
                    "generator installed"
                );
                self.catalog
                    .write()
                    .generators
                    .insert(generator.namespace().to_string(), generator);
            }
        }
        Ok(())
    }

    fn evaluate(&mut self, command: String, results: ResultChannel) -> Result<(), EngineError> {
        let Some(jobs) = self.jobs.as_ref() else {
            return Err(EngineError::Unavailable("engine disposed".to_string()));
        };
        jobs.send(Job { command, results })
            .map_err(|_| EngineError::Unavailable("engine thread stopped".to_string()))
    }

    fn dispose(&mut self) {
        if self.jobs.take().is_some() {
            info!(tier = %self.tier, "template engine disposed");
        }
    }
}

impl Drop for TemplateScriptEngine {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Creates [`TemplateScriptEngine`] sessions of a fixed tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEngineFactory {
    tier: EscapingTier,
}

impl TemplateEngineFactory {
    /// Creates a factory producing engines of `tier`.
    #[must_use]
    pub const fn new(tier: EscapingTier) -> Self {
        Self { tier }
    }

    /// Creates a factory matching the host capability in `settings`.
    #[must_use]
    pub const fn from_settings(settings: &BridgeSettings) -> Self {
        Self::new(settings.escaping_tier())
    }
}

impl EngineFactory for TemplateEngineFactory {
    type Engine = TemplateScriptEngine;

    fn create(&self) -> Result<TemplateScriptEngine, EngineError> {
        TemplateScriptEngine::start(self.tier)
    }
}
