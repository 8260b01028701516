//! Lifecycle-bound request queue.
//!
//! [`CodeGeneratorManager`] accepts requests from any thread and feeds them,
//! one at a time and in submission order, to a [`CodeGeneratorService`] that
//! lives only while the host is resumed.
//!
//! Each resume starts a new *lifespan*: a fresh engine session plus a
//! dispatch task. Pausing ends the lifespan. The request in flight and every
//! queued request are dropped without their callbacks firing.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use blockgen_domain::{CodeGenerationRequest, GenerationResult, LanguageDefinition};
use parking_lot::{Mutex, ReentrantMutex};
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::ports::{CancellationReceiver, CancellationToken, EngineFactory, ResourceLoader};
use crate::service::{CodeGeneratorService, EngineHandle, ServiceError};

/// State shared between the manager and its dispatch task.
struct Shared {
    queue: Mutex<VecDeque<CodeGenerationRequest>>,
    wake: Notify,
    /// Bumped on every pause. A dispatch task only serves its own epoch.
    epoch: AtomicU64,
    /// Held while a callback runs, so a pause never overlaps a delivery.
    delivery: ReentrantMutex<()>,
}

impl Shared {
    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::SeqCst) == epoch
    }

    fn pop_for(&self, epoch: u64) -> Option<CodeGenerationRequest> {
        let mut queue = self.queue.lock();
        if self.is_current(epoch) {
            queue.pop_front()
        } else {
            None
        }
    }

    /// Runs the request's callback unless the lifespan has ended.
    ///
    /// A panicking callback is contained here so the queue keeps moving.
    fn deliver(&self, epoch: u64, request: CodeGenerationRequest, result: GenerationResult) {
        let _gate = self.delivery.lock();
        let request_id = request.id();
        if !self.is_current(epoch) {
            info!(%request_id, "lifespan ended before delivery; dropping result");
            return;
        }
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| request.complete(result))) {
            warn!(
                %request_id,
                panic = panic_message(payload.as_ref()),
                "code generation callback panicked"
            );
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

struct Lifespan<E> {
    token: CancellationToken,
    epoch: u64,
    engine: EngineHandle<E>,
}

/// Lifecycle façade and FIFO request queue for code generation.
pub struct CodeGeneratorManager<F: EngineFactory> {
    runtime: Handle,
    factory: Arc<F>,
    loader: Arc<dyn ResourceLoader>,
    generation_timeout: Option<Duration>,
    shared: Arc<Shared>,
    lifespan: Mutex<Option<Lifespan<F::Engine>>>,
}

impl<F: EngineFactory> CodeGeneratorManager<F> {
    /// Creates a paused manager whose dispatch tasks run on `runtime`.
    pub fn new(runtime: Handle, factory: F, loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            runtime,
            factory: Arc::new(factory),
            loader,
            generation_timeout: None,
            shared: Arc::new(Shared {
                queue: Mutex::new(VecDeque::new()),
                wake: Notify::new(),
                epoch: AtomicU64::new(0),
                delivery: ReentrantMutex::new(()),
            }),
            lifespan: Mutex::new(None),
        }
    }

    /// Sets a per-request generation deadline.
    ///
    /// A request whose deadline passes is dropped without a callback and the
    /// next request is dispatched.
    #[must_use]
    pub const fn with_generation_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.generation_timeout = timeout;
        self
    }

    /// Returns true between `on_resume` and `on_pause`.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifespan.lock().is_some()
    }

    /// Returns the number of requests waiting for dispatch.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// Host became active: create an engine session and start dispatching.
    ///
    /// Calling this while already resumed does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine session cannot be created. The manager
    /// stays paused and queued requests keep waiting.
    pub fn on_resume(&self) -> Result<(), ServiceError> {
        let mut lifespan = self.lifespan.lock();
        if lifespan.is_some() {
            debug!("on_resume while already resumed; ignoring");
            return Ok(());
        }

        let mut service =
            CodeGeneratorService::new(Arc::clone(&self.factory), Arc::clone(&self.loader))
                .with_generation_timeout(self.generation_timeout);
        service.activate()?;
        let engine = service.engine_handle().ok_or(ServiceError::NotActive)?;

        let epoch = self.shared.epoch.load(Ordering::SeqCst);
        let (token, cancel) = CancellationToken::new();
        let shared = Arc::clone(&self.shared);
        self.runtime.spawn(
            dispatch_loop(service, shared, epoch, cancel)
                .instrument(info_span!("codegen_dispatch", epoch)),
        );

        *lifespan = Some(Lifespan {
            token,
            epoch,
            engine,
        });
        info!(
            epoch,
            pending = self.pending_len(),
            "code generation resumed"
        );
        Ok(())
    }

    /// Host became inactive: drop the request in flight and the queue, and
    /// dispose the engine session.
    ///
    /// When this returns, the engine is disposed and no callback of a dropped
    /// request is running or will ever run. Calling this while paused does
    /// nothing.
    pub fn on_pause(&self) {
        let Some(lifespan) = self.lifespan.lock().take() else {
            debug!("on_pause while already paused; ignoring");
            return;
        };

        self.shared.epoch.fetch_add(1, Ordering::SeqCst);
        lifespan.token.cancel();
        lifespan.engine.dispose();

        let dropped = {
            let _gate = self.shared.delivery.lock();
            std::mem::take(&mut *self.shared.queue.lock())
        };
        info!(
            epoch = lifespan.epoch,
            dropped = dropped.len(),
            "code generation paused"
        );
    }

    /// Queues a request. Safe to call from any thread, in any lifecycle state.
    ///
    /// Requests queued while paused wait for the next `on_resume`.
    pub fn request_code_generation(&self, request: CodeGenerationRequest) {
        let pending = {
            let mut queue = self.shared.queue.lock();
            queue.push_back(request);
            queue.len()
        };
        debug!(pending, "code generation request queued");
        self.shared.wake.notify_one();
    }
}

impl<F: EngineFactory> Drop for CodeGeneratorManager<F> {
    fn drop(&mut self) {
        self.on_pause();
    }
}

enum Step {
    Finished(Option<GenerationResult>),
    Cancelled,
}

async fn dispatch_loop<F: EngineFactory>(
    mut service: CodeGeneratorService<F>,
    shared: Arc<Shared>,
    epoch: u64,
    mut cancel: CancellationReceiver,
) {
    loop {
        let request = match shared.pop_for(epoch) {
            Some(request) => request,
            None => {
                if !shared.is_current(epoch) {
                    break;
                }
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = shared.wake.notified() => {}
                }
                continue;
            }
        };

        let request_id = request.id();
        debug!(
            %request_id,
            language = %request.language(),
            pending = shared.queue.lock().len(),
            "dispatching code generation"
        );

        let content = request.workspace_content();
        let language = request.language();
        let block_definitions = request.block_definitions();
        let generator_scripts = request.all_generator_scripts();
        let step = tokio::select! {
            biased;
            () = cancel.cancelled() => Step::Cancelled,
            outcome = generate(
                &mut service,
                content,
                language,
                block_definitions,
                generator_scripts,
            ) => Step::Finished(outcome),
        };

        match step {
            Step::Finished(Some(result)) => shared.deliver(epoch, request, result),
            Step::Finished(None) => {
                info!(%request_id, "dropping request after missed deadline");
            }
            Step::Cancelled => {
                info!(%request_id, "lifespan ended mid-generation; dropping request");
                break;
            }
        }
    }

    service.deactivate();
}

/// Runs one request against the session.
///
/// Returns `None` when the request must be dropped without a callback.
async fn generate<F: EngineFactory>(
    service: &mut CodeGeneratorService<F>,
    content: &str,
    language: &LanguageDefinition,
    block_definitions: &[String],
    generator_scripts: Vec<String>,
) -> Option<GenerationResult> {
    if let Err(error) = service
        .ensure_resources_loaded(block_definitions, &generator_scripts)
        .await
    {
        warn!(%language, %error, "resources failed to load");
        return Some(Err(error.into()));
    }

    let command = match service.build_command(content, language) {
        Ok(command) => command,
        Err(error) => return Some(Err(error.into())),
    };

    match service.execute(command).await {
        Ok(code) => Some(Ok(code)),
        Err(ServiceError::TimedOut(deadline)) => {
            warn!(%language, ?deadline, "generation timed out");
            None
        }
        Err(error) => {
            warn!(%language, %error, "generation failed");
            Some(Err(error.into()))
        }
    }
}
