//! Embedded script engine port
//!
//! The engine runs in its own execution context. Commands are handed over
//! together with a [`ResultChannel`]; the engine answers through that channel
//! exactly once, from whatever thread it likes, whenever generation finishes.

use std::fmt;

use blockgen_domain::EscapingTier;
use thiserror::Error;
use tokio::sync::oneshot;

/// Kind of resource being loaded into an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Block definitions (block types and their fields).
    BlockDefinitions,
    /// Generator definitions for one or more target languages.
    GeneratorScript,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlockDefinitions => write!(f, "block definitions"),
            Self::GeneratorScript => write!(f, "generator script"),
        }
    }
}

/// Errors reported by a script engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not be created or has shut down.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The engine refused a resource or command before running it.
    #[error("engine rejected input: {0}")]
    Rejected(String),

    /// The engine dropped the result channel without answering.
    #[error("engine closed the result channel without a result")]
    ResultChannelClosed,

    /// Script evaluation failed inside the engine.
    #[error("script error: {0}")]
    Script(String),
}

/// Receiving half of a [`ResultChannel`].
pub type ResultReceiver = oneshot::Receiver<Result<String, EngineError>>;

/// Single-use channel an engine answers one command through.
#[derive(Debug)]
pub struct ResultChannel {
    sender: oneshot::Sender<Result<String, EngineError>>,
}

impl ResultChannel {
    /// Creates a channel and the receiver the caller suspends on.
    #[must_use]
    pub fn new() -> (Self, ResultReceiver) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// Delivers generated code. Returns false if nobody is waiting anymore.
    pub fn deliver(self, generated_code: String) -> bool {
        self.sender.send(Ok(generated_code)).is_ok()
    }

    /// Delivers a failure. Returns false if nobody is waiting anymore.
    pub fn fail(self, error: EngineError) -> bool {
        self.sender.send(Err(error)).is_ok()
    }

    /// Returns true if the waiting side has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Port for an embedded, sandboxed script engine instance.
///
/// One instance is one engine session. Implementations are driven by a single
/// owner and never see two overlapping `evaluate` calls from it.
pub trait ScriptEngine: Send + 'static {
    /// Returns the compatibility tier of this engine.
    fn tier(&self) -> EscapingTier;

    /// Loads a resource's source text into the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails to parse or install the resource.
    fn load_resource(
        &mut self,
        kind: ResourceKind,
        name: &str,
        source: &str,
    ) -> Result<(), EngineError>;

    /// Starts evaluating a command. The outcome arrives through `results`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not be handed to the engine at
    /// all. In that case `results` is dropped unanswered.
    fn evaluate(&mut self, command: String, results: ResultChannel) -> Result<(), EngineError>;

    /// Releases engine resources. Pending commands are abandoned.
    fn dispose(&mut self);
}

/// Port for creating engine sessions.
pub trait EngineFactory: Send + Sync + 'static {
    /// Engine type produced by this factory.
    type Engine: ScriptEngine;

    /// Creates a fresh engine session.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot provide an engine right now.
    fn create(&self) -> Result<Self::Engine, EngineError>;
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_result_channel_delivers_across_threads() {
        let (channel, receiver) = ResultChannel::new();
        std::thread::spawn(move || {
            assert!(channel.deliver("'test';".to_string()));
        });
        assert_eq!(receiver.await.expect("answer"), Ok("'test';".to_string()));
    }

    #[tokio::test]
    async fn test_dropped_channel_closes_receiver() {
        let (channel, receiver) = ResultChannel::new();
        drop(channel);
        assert!(receiver.await.is_err());
    }

    #[test]
    fn test_deliver_after_receiver_gone() {
        let (channel, receiver) = ResultChannel::new();
        drop(receiver);
        assert!(channel.is_closed());
        assert!(!channel.fail(EngineError::ResultChannelClosed));
    }
}
