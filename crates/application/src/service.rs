//! Engine session host.
//!
//! [`CodeGeneratorService`] owns at most one engine session at a time and
//! runs exactly one command against it at a time. Its state machine:
//!
//! ```text
//! Uninitialized --activate--> Ready --execute--> Generating --result--> Ready
//!       any state --deactivate--> Disposed --activate--> Ready (fresh session)
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use blockgen_domain::{EscapingTier, GenerationError, LanguageDefinition};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ports::{
    EngineError, EngineFactory, ResourceKind, ResourceLoader, ResultChannel, ScriptEngine,
};

/// Lifecycle state of the engine session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No session has been created yet.
    Uninitialized,
    /// A session exists and accepts work.
    Ready,
    /// A command is running inside the session.
    Generating,
    /// The session was released.
    Disposed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Ready => write!(f, "ready"),
            Self::Generating => write!(f, "generating"),
            Self::Disposed => write!(f, "disposed"),
        }
    }
}

/// Stage at which a resource load failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// The resource could not be fetched.
    Fetch,
    /// The engine could not parse the resource.
    Parse,
}

/// A block-definition or generator resource failed to load.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind:?} failure for {resource_kind} `{resource}`: {reason}")]
pub struct LoadError {
    /// Identifier of the failing resource.
    pub resource: String,
    /// What the resource was loaded as.
    pub resource_kind: ResourceKind,
    /// Whether fetching or parsing failed.
    pub kind: LoadErrorKind,
    /// Human readable cause.
    pub reason: String,
}

/// Errors raised by [`CodeGeneratorService`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The service was never activated.
    #[error("engine session not activated")]
    NotActive,

    /// The session was disposed.
    #[error("engine session disposed")]
    Disposed,

    /// The session is busy or otherwise unable to take the call.
    #[error("engine session is {0}, expected ready")]
    NotReady(SessionState),

    /// A resource failed to load. The session stays ready.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The engine failed.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// No result arrived before the deadline. The session is ready again.
    #[error("no result within {0:?}")]
    TimedOut(Duration),
}

impl From<ServiceError> for GenerationError {
    fn from(error: ServiceError) -> Self {
        match error {
            ServiceError::Load(load) => Self::ResourceLoad {
                resource: load.resource,
                reason: load.reason,
            },
            other => Self::Engine(other.to_string()),
        }
    }
}

/// Shared handle to a live engine.
///
/// The service drives the engine through the handle, and the lifecycle owner
/// keeps a clone so it can dispose the engine without waiting for the
/// service. Once disposed, every service call on the session fails with
/// [`ServiceError::Disposed`].
pub struct EngineHandle<E> {
    engine: Arc<Mutex<Option<E>>>,
}

impl<E> Clone for EngineHandle<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

impl<E: ScriptEngine> EngineHandle<E> {
    fn new(engine: E) -> Self {
        Self {
            engine: Arc::new(Mutex::new(Some(engine))),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut E) -> R) -> Option<R> {
        self.engine.lock().as_mut().map(f)
    }

    /// Disposes the engine. Returns false if it was already disposed.
    pub fn dispose(&self) -> bool {
        let Some(mut engine) = self.engine.lock().take() else {
            return false;
        };
        engine.dispose();
        true
    }
}

struct EngineSession<E> {
    engine: EngineHandle<E>,
    tier: EscapingTier,
    loaded: HashSet<(ResourceKind, String)>,
}

/// Host of one embedded engine session.
pub struct CodeGeneratorService<F: EngineFactory> {
    factory: Arc<F>,
    loader: Arc<dyn ResourceLoader>,
    generation_timeout: Option<Duration>,
    state: SessionState,
    session: Option<EngineSession<F::Engine>>,
}

impl<F: EngineFactory> CodeGeneratorService<F> {
    /// Creates an inactive service.
    pub fn new(factory: Arc<F>, loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            factory,
            loader,
            generation_timeout: None,
            state: SessionState::Uninitialized,
            session: None,
        }
    }

    /// Sets the deadline for a single `execute` call.
    #[must_use]
    pub const fn with_generation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Returns the current session state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Returns the escaping tier fixed at activation, if a session exists.
    #[must_use]
    pub fn tier(&self) -> Option<EscapingTier> {
        self.session.as_ref().map(|session| session.tier)
    }

    /// Returns true if the resource is loaded as `kind` in the current session.
    #[must_use]
    pub fn is_loaded(&self, kind: ResourceKind, resource: &str) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.loaded.contains(&(kind, resource.to_string())))
    }

    /// Returns a handle to the live engine, if a session exists.
    #[must_use]
    pub fn engine_handle(&self) -> Option<EngineHandle<F::Engine>> {
        self.session
            .as_ref()
            .map(|session| session.engine.clone())
    }

    /// Creates the engine session. Does nothing if one is already live.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Engine`] if the factory cannot create an engine.
    /// The state is left unchanged in that case.
    pub fn activate(&mut self) -> Result<(), ServiceError> {
        if matches!(self.state, SessionState::Ready | SessionState::Generating) {
            debug!("activate called on live session; ignoring");
            return Ok(());
        }

        let engine = self.factory.create()?;
        let tier = engine.tier();
        self.session = Some(EngineSession {
            engine: EngineHandle::new(engine),
            tier,
            loaded: HashSet::new(),
        });
        self.state = SessionState::Ready;
        info!(%tier, "engine session created");
        Ok(())
    }

    /// Disposes the engine session. Any command in flight is abandoned.
    pub fn deactivate(&mut self) {
        if let Some(session) = self.session.take() {
            let disposed_here = session.engine.dispose();
            info!(
                resources = session.loaded.len(),
                was = %self.state,
                disposed_here,
                "engine session disposed"
            );
        }
        self.state = SessionState::Disposed;
    }

    /// Loads every resource not yet present in the session.
    ///
    /// Block definitions load before generator scripts. Resources loaded
    /// before a failure stay loaded.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Load`] for the first resource that fails to
    /// fetch or parse, or a state error if the session is not ready.
    pub async fn ensure_resources_loaded(
        &mut self,
        block_definitions: &[String],
        generator_scripts: &[String],
    ) -> Result<(), ServiceError> {
        self.require_ready()?;
        let loader = Arc::clone(&self.loader);
        let Some(session) = self.session.as_mut() else {
            return Err(ServiceError::NotActive);
        };

        let wanted = block_definitions
            .iter()
            .map(|name| (ResourceKind::BlockDefinitions, name))
            .chain(
                generator_scripts
                    .iter()
                    .map(|name| (ResourceKind::GeneratorScript, name)),
            );

        for (resource_kind, name) in wanted {
            let key = (resource_kind, name.clone());
            if session.loaded.contains(&key) {
                continue;
            }

            let source = loader.fetch(name).await.map_err(|e| {
                warn!(resource = %name, error = %e, "failed to fetch resource");
                LoadError {
                    resource: name.clone(),
                    resource_kind,
                    kind: LoadErrorKind::Fetch,
                    reason: e.to_string(),
                }
            })?;

            let Some(loaded) = session
                .engine
                .with(|engine| engine.load_resource(resource_kind, name, &source))
            else {
                self.state = SessionState::Disposed;
                return Err(ServiceError::Disposed);
            };
            loaded.map_err(|e| {
                    warn!(resource = %name, error = %e, "engine rejected resource");
                    LoadError {
                        resource: name.clone(),
                        resource_kind,
                        kind: LoadErrorKind::Parse,
                        reason: e.to_string(),
                    }
                })?;

            debug!(resource = %name, kind = %resource_kind, "resource loaded");
            session.loaded.insert(key);
        }

        Ok(())
    }

    /// Builds the engine command for `content` using the session's tier.
    ///
    /// # Errors
    ///
    /// Returns a state error if no session is live.
    pub fn build_command(
        &self,
        content: &str,
        language: &LanguageDefinition,
    ) -> Result<String, ServiceError> {
        let tier = match self.state {
            SessionState::Uninitialized => return Err(ServiceError::NotActive),
            SessionState::Disposed => return Err(ServiceError::Disposed),
            SessionState::Ready | SessionState::Generating => {
                self.tier().ok_or(ServiceError::NotActive)?
            }
        };
        Ok(tier.build_command(content, language.generator_namespace()))
    }

    /// Runs one command and waits for the engine's result.
    ///
    /// The call suspends until the engine answers on its result channel.
    /// If the returned future is dropped mid-flight, the session stays
    /// `Generating` and has to be deactivated.
    ///
    /// # Errors
    ///
    /// Returns a state error unless the session is ready,
    /// [`ServiceError::Engine`] if the engine rejects the command or reports a
    /// failure, and [`ServiceError::TimedOut`] if a deadline is configured and
    /// passes first.
    pub async fn execute(&mut self, command: String) -> Result<String, ServiceError> {
        self.require_ready()?;
        let Some(session) = self.session.as_mut() else {
            return Err(ServiceError::NotActive);
        };

        let (channel, receiver) = ResultChannel::new();
        let Some(evaluated) = session
            .engine
            .with(|engine| engine.evaluate(command, channel))
        else {
            self.state = SessionState::Disposed;
            return Err(ServiceError::Disposed);
        };
        evaluated?;
        self.state = SessionState::Generating;

        let answer = match self.generation_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, receiver).await {
                Ok(answer) => answer,
                Err(_) => {
                    self.state = SessionState::Ready;
                    return Err(ServiceError::TimedOut(deadline));
                }
            },
            None => receiver.await,
        };
        self.state = SessionState::Ready;

        match answer {
            Ok(Ok(code)) => Ok(code),
            Ok(Err(error)) => Err(ServiceError::Engine(error)),
            Err(_) => Err(ServiceError::Engine(EngineError::ResultChannelClosed)),
        }
    }

    fn require_ready(&self) -> Result<(), ServiceError> {
        match self.state {
            SessionState::Ready => Ok(()),
            SessionState::Uninitialized => Err(ServiceError::NotActive),
            SessionState::Disposed => Err(ServiceError::Disposed),
            SessionState::Generating => Err(ServiceError::NotReady(SessionState::Generating)),
        }
    }
}

impl<F: EngineFactory> Drop for CodeGeneratorService<F> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.engine.dispose();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
pub(crate) mod tests {
    use super::*;
    use crate::ports::ResourceError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// How the mock engine answers commands.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Answer {
        /// Reply with `<namespace>:<content>` on another thread.
        Echo,
        /// Keep the channel and never reply.
        Never,
        /// Reply with a script error.
        Fail,
        /// Drop the channel unanswered.
        Drop,
    }

    #[derive(Default)]
    pub struct EngineLog {
        pub loads: Mutex<Vec<String>>,
        pub commands: Mutex<Vec<String>>,
        pub created: AtomicUsize,
        pub disposed: AtomicUsize,
        pub parked: Mutex<Vec<ResultChannel>>,
    }

    pub struct MockEngine {
        tier: EscapingTier,
        answer: Arc<Mutex<Answer>>,
        log: Arc<EngineLog>,
    }

    impl ScriptEngine for MockEngine {
        fn tier(&self) -> EscapingTier {
            self.tier
        }

        fn load_resource(
            &mut self,
            _kind: ResourceKind,
            name: &str,
            source: &str,
        ) -> Result<(), EngineError> {
            if source.contains("syntax error") {
                return Err(EngineError::Script(format!("cannot parse {name}")));
            }
            self.log.loads.lock().unwrap().push(name.to_string());
            Ok(())
        }

        fn evaluate(&mut self, command: String, results: ResultChannel) -> Result<(), EngineError> {
            self.log.commands.lock().unwrap().push(command.clone());
            let answer = *self.answer.lock().unwrap();
            match answer {
                Answer::Echo => {
                    let tier = self.tier;
                    std::thread::spawn(move || {
                        let parsed = tier.parse_command(&command).expect("well-formed command");
                        results.deliver(format!(
                            "{}:{}",
                            parsed.generator_namespace, parsed.content
                        ));
                    });
                }
                Answer::Never => self.log.parked.lock().unwrap().push(results),
                Answer::Fail => {
                    results.fail(EngineError::Script("generator threw".to_string()));
                }
                Answer::Drop => drop(results),
            }
            Ok(())
        }

        fn dispose(&mut self) {
            self.log.disposed.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub struct MockFactory {
        pub tier: EscapingTier,
        pub answer: Arc<Mutex<Answer>>,
        pub log: Arc<EngineLog>,
        pub unavailable: bool,
    }

    impl MockFactory {
        pub fn new(answer: Answer) -> Self {
            Self {
                tier: EscapingTier::Modern,
                answer: Arc::new(Mutex::new(answer)),
                log: Arc::new(EngineLog::default()),
                unavailable: false,
            }
        }
    }

    impl EngineFactory for MockFactory {
        type Engine = MockEngine;

        fn create(&self) -> Result<MockEngine, EngineError> {
            if self.unavailable {
                return Err(EngineError::Unavailable("host inactive".to_string()));
            }
            self.log.created.fetch_add(1, Ordering::SeqCst);
            Ok(MockEngine {
                tier: self.tier,
                answer: Arc::clone(&self.answer),
                log: Arc::clone(&self.log),
            })
        }
    }

    #[derive(Default)]
    pub struct MockLoader {
        pub resources: HashMap<String, String>,
        pub fetches: Mutex<Vec<String>>,
    }

    impl MockLoader {
        pub fn with(resources: &[(&str, &str)]) -> Self {
            Self {
                resources: resources
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect(),
                fetches: Mutex::new(Vec::new()),
            }
        }

        pub fn standard() -> Self {
            Self::with(&[
                ("default/test_blocks.json", "[]"),
                ("generators/javascript.json", "{}"),
                ("generators/lua.json", "{}"),
                ("generators/python.json", "{}"),
                ("generators/php.json", "{}"),
                ("generators/dart.json", "{}"),
                ("generators/test_javascript.json", "{}"),
                ("broken.json", "syntax error"),
            ])
        }
    }

    #[async_trait]
    impl ResourceLoader for MockLoader {
        async fn fetch(&self, resource: &str) -> Result<String, ResourceError> {
            self.fetches.lock().unwrap().push(resource.to_string());
            self.resources
                .get(resource)
                .cloned()
                .ok_or_else(|| ResourceError::NotFound(resource.to_string()))
        }
    }

    fn service(factory: MockFactory, loader: MockLoader) -> CodeGeneratorService<MockFactory> {
        CodeGeneratorService::new(Arc::new(factory), Arc::new(loader))
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_activate_is_idempotent() {
        let factory = MockFactory::new(Answer::Echo);
        let log = Arc::clone(&factory.log);
        let mut service = service(factory, MockLoader::standard());

        assert_eq!(service.state(), SessionState::Uninitialized);
        service.activate().unwrap();
        service.activate().unwrap();

        assert_eq!(service.state(), SessionState::Ready);
        assert_eq!(log.created.load(Ordering::SeqCst), 1);
        assert_eq!(service.tier(), Some(EscapingTier::Modern));
    }

    #[test]
    fn test_activate_failure_keeps_state() {
        let mut factory = MockFactory::new(Answer::Echo);
        factory.unavailable = true;
        let mut service = service(factory, MockLoader::standard());

        let err = service.activate().unwrap_err();
        assert!(matches!(err, ServiceError::Engine(EngineError::Unavailable(_))));
        assert_eq!(service.state(), SessionState::Uninitialized);
    }

    #[test]
    fn test_deactivate_disposes_and_reactivate_starts_fresh() {
        let factory = MockFactory::new(Answer::Echo);
        let log = Arc::clone(&factory.log);
        let mut service = service(factory, MockLoader::standard());

        service.activate().unwrap();
        service.deactivate();
        assert_eq!(service.state(), SessionState::Disposed);
        assert_eq!(log.disposed.load(Ordering::SeqCst), 1);
        assert_eq!(service.tier(), None);

        service.activate().unwrap();
        assert_eq!(service.state(), SessionState::Ready);
        assert_eq!(log.created.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_operations_on_disposed_session_fail() {
        let mut service = service(MockFactory::new(Answer::Echo), MockLoader::standard());
        assert_eq!(
            service.execute("x".to_string()).await,
            Err(ServiceError::NotActive)
        );

        service.activate().unwrap();
        service.deactivate();

        assert_eq!(
            service.execute("x".to_string()).await,
            Err(ServiceError::Disposed)
        );
        assert_eq!(
            service.ensure_resources_loaded(&[], &[]).await,
            Err(ServiceError::Disposed)
        );
        assert_eq!(
            service.build_command("<xml/>", &LanguageDefinition::javascript()),
            Err(ServiceError::Disposed)
        );
    }

    #[tokio::test]
    async fn test_resources_accumulate_without_reloading() {
        let factory = MockFactory::new(Answer::Echo);
        let log = Arc::clone(&factory.log);
        let loader = Arc::new(MockLoader::standard());
        let mut service = CodeGeneratorService::new(Arc::new(factory), loader.clone());
        service.activate().unwrap();

        service
            .ensure_resources_loaded(
                &names(&["default/test_blocks.json"]),
                &names(&["generators/javascript.json"]),
            )
            .await
            .unwrap();
        service
            .ensure_resources_loaded(
                &names(&["default/test_blocks.json"]),
                &names(&["generators/javascript.json", "generators/lua.json"]),
            )
            .await
            .unwrap();

        assert_eq!(
            *log.loads.lock().unwrap(),
            names(&[
                "default/test_blocks.json",
                "generators/javascript.json",
                "generators/lua.json"
            ])
        );
        assert_eq!(loader.fetches.lock().unwrap().len(), 3);
        assert!(service.is_loaded(ResourceKind::GeneratorScript, "generators/lua.json"));
    }

    #[tokio::test]
    async fn test_load_failure_keeps_session_ready() {
        let mut service = service(MockFactory::new(Answer::Echo), MockLoader::standard());
        service.activate().unwrap();

        let missing = service
            .ensure_resources_loaded(&names(&["missing.json"]), &[])
            .await
            .unwrap_err();
        let ServiceError::Load(load) = missing else {
            panic!("expected load error, got {missing:?}");
        };
        assert_eq!(load.kind, LoadErrorKind::Fetch);
        assert_eq!(load.resource, "missing.json");

        let broken = service
            .ensure_resources_loaded(&[], &names(&["broken.json"]))
            .await
            .unwrap_err();
        assert!(matches!(
            broken,
            ServiceError::Load(LoadError {
                kind: LoadErrorKind::Parse,
                resource_kind: ResourceKind::GeneratorScript,
                ..
            })
        ));
        assert_eq!(service.state(), SessionState::Ready);
        assert!(!service.is_loaded(ResourceKind::BlockDefinitions, "broken.json"));
    }

    #[tokio::test]
    async fn test_same_identifier_loads_once_per_kind() {
        let factory = MockFactory::new(Answer::Echo);
        let log = Arc::clone(&factory.log);
        let mut service = service(factory, MockLoader::with(&[("shared.json", "[]")]));
        service.activate().unwrap();

        service
            .ensure_resources_loaded(&names(&["shared.json"]), &[])
            .await
            .unwrap();
        service
            .ensure_resources_loaded(&names(&["shared.json"]), &names(&["shared.json"]))
            .await
            .unwrap();

        assert_eq!(
            *log.loads.lock().unwrap(),
            names(&["shared.json", "shared.json"])
        );
        assert!(service.is_loaded(ResourceKind::BlockDefinitions, "shared.json"));
        assert!(service.is_loaded(ResourceKind::GeneratorScript, "shared.json"));
    }

    #[tokio::test]
    async fn test_engine_disposed_through_handle() {
        let factory = MockFactory::new(Answer::Echo);
        let log = Arc::clone(&factory.log);
        let mut service = service(factory, MockLoader::standard());
        assert!(service.engine_handle().is_none());
        service.activate().unwrap();

        let handle = service.engine_handle().unwrap();
        assert!(handle.dispose());
        assert!(!handle.clone().dispose());
        assert_eq!(log.disposed.load(Ordering::SeqCst), 1);

        assert_eq!(
            service.execute("x".to_string()).await,
            Err(ServiceError::Disposed)
        );
        assert_eq!(service.state(), SessionState::Disposed);

        service.deactivate();
        assert!(!handle.dispose());
        assert_eq!(log.disposed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_returns_engine_result() {
        let mut service = service(MockFactory::new(Answer::Echo), MockLoader::standard());
        service.activate().unwrap();

        let command = service
            .build_command("a ' b", &LanguageDefinition::lua())
            .unwrap();
        assert_eq!(command, "javascript:invoke('a \\' b', Blockly.Lua);");

        let code = service.execute(command).await.unwrap();
        assert_eq!(code, "Blockly.Lua:a ' b");
        assert_eq!(service.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_legacy_tier_is_fixed_at_activation() {
        let mut factory = MockFactory::new(Answer::Echo);
        factory.tier = EscapingTier::Legacy;
        let mut service = service(factory, MockLoader::standard());
        service.activate().unwrap();

        let command = service
            .build_command("a ' b", &LanguageDefinition::javascript())
            .unwrap();
        assert_eq!(
            command,
            "javascript:invoke('a%20%27%20b', Blockly.JavaScript);"
        );
        assert_eq!(
            service.execute(command).await.unwrap(),
            "Blockly.JavaScript:a ' b"
        );
    }

    #[tokio::test]
    async fn test_execute_surfaces_engine_failures() {
        let factory = MockFactory::new(Answer::Fail);
        let answer = Arc::clone(&factory.answer);
        let mut service = service(factory, MockLoader::standard());
        service.activate().unwrap();

        assert!(matches!(
            service.execute("cmd".to_string()).await,
            Err(ServiceError::Engine(EngineError::Script(_)))
        ));

        *answer.lock().unwrap() = Answer::Drop;
        assert_eq!(
            service.execute("cmd".to_string()).await,
            Err(ServiceError::Engine(EngineError::ResultChannelClosed))
        );
        assert_eq!(service.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_execute_times_out_and_recovers() {
        let factory = MockFactory::new(Answer::Never);
        let answer = Arc::clone(&factory.answer);
        let mut service = service(factory, MockLoader::standard())
            .with_generation_timeout(Some(Duration::from_millis(20)));
        service.activate().unwrap();

        let command = service
            .build_command("x", &LanguageDefinition::javascript())
            .unwrap();
        assert_eq!(
            service.execute(command.clone()).await,
            Err(ServiceError::TimedOut(Duration::from_millis(20)))
        );
        assert_eq!(service.state(), SessionState::Ready);

        *answer.lock().unwrap() = Answer::Echo;
        assert_eq!(
            service.execute(command).await.unwrap(),
            "Blockly.JavaScript:x"
        );
    }

    #[test]
    fn test_load_error_converts_to_generation_error() {
        let error = ServiceError::Load(LoadError {
            resource: "a.json".to_string(),
            resource_kind: ResourceKind::BlockDefinitions,
            kind: LoadErrorKind::Fetch,
            reason: "gone".to_string(),
        });
        assert_eq!(
            GenerationError::from(error),
            GenerationError::ResourceLoad {
                resource: "a.json".to_string(),
                reason: "gone".to_string(),
            }
        );
    }
}
