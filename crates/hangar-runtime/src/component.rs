//! # Component Contract
//!
//! Every unit an environment manages (a container, a database seeder, a
//! local process) implements [`Component`]. The engine decides *when* each
//! method runs; the implementation owns *what* it does and its own status.
//!
//! A component's identity is the name it is registered under in the
//! [`ComponentGraph`](crate::ComponentGraph). The contract deliberately has no
//! `name()` method; the name arrives through the [`Writer`] handed over at
//! attach time.

use std::sync::Arc;

use async_trait::async_trait;
use hangar_output::Writer;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::status::ComponentStatus;

/// Errors raised by component implementations.
#[derive(Debug, Error)]
pub enum ComponentError {
    /// A plain failure description.
    #[error("{0}")]
    Message(String),

    /// The operation observed cancellation and gave up.
    #[error("operation cancelled")]
    Cancelled,

    /// Any other underlying error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ComponentError {
    /// Shorthand for [`ComponentError::Message`].
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Callback receiving orchestration progress messages.
pub type LogFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Back-reference from a component to the environment it belongs to.
///
/// Carries the environment id and its logging callback. Cloning is cheap and
/// does not keep the environment alive.
#[derive(Clone)]
pub struct EnvironmentHandle {
    id: Arc<str>,
    log: LogFn,
}

impl EnvironmentHandle {
    pub(crate) fn new(id: &str, log: LogFn) -> Self {
        Self { id: id.into(), log }
    }

    /// Normalized environment id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Send a message to the environment's logging callback.
    pub fn log(&self, message: &str) {
        (self.log)(message);
    }

    /// The logging callback itself.
    #[must_use]
    pub fn log_fn(&self) -> LogFn {
        Arc::clone(&self.log)
    }
}

impl std::fmt::Debug for EnvironmentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Logging callback that discards everything.
#[must_use]
pub fn noop_log_fn() -> LogFn {
    Arc::new(|_: &str| {})
}

/// Lifecycle contract for a managed unit.
///
/// All operations receive the caller's cancellation token. Honouring it is
/// up to the implementation; the engine never interrupts a call.
#[async_trait]
pub trait Component: Send + Sync {
    /// Stable kind discriminator, e.g. `"container"` or `"seed"`.
    fn component_type(&self) -> &str;

    /// Called exactly once while the environment is being built, before any
    /// other lifecycle method.
    ///
    /// The writer is scoped to this component's name. An implementation may
    /// reconcile with external state here (e.g. resume watching a process
    /// left running by an earlier run).
    async fn attach_environment(
        &self,
        ctx: &CancellationToken,
        env: EnvironmentHandle,
        writer: Writer,
    ) -> Result<(), ComponentError>;

    /// Idempotent pre-start work such as fetching an artifact. Must not start
    /// the workload.
    async fn prepare(&self, ctx: &CancellationToken) -> Result<(), ComponentError>;

    /// Drive the component towards an active state.
    ///
    /// Long-running workloads may return once launch is underway and report
    /// readiness through [`Component::status`]. One-shot tasks do all their
    /// work here and end in `finished` or `failed`.
    async fn start(&self, ctx: &CancellationToken) -> Result<(), ComponentError>;

    /// Stop the component. Stopping a stopped component succeeds.
    async fn stop(&self, ctx: &CancellationToken) -> Result<(), ComponentError>;

    /// Release durable resources (images, networks, volumes). Safe to call
    /// whether or not the component ever ran.
    async fn cleanup(&self, ctx: &CancellationToken) -> Result<(), ComponentError>;

    /// Current status, possibly re-validated against the outside world.
    async fn status(&self, ctx: &CancellationToken) -> Result<ComponentStatus, ComponentError>;

    /// Presentation snapshot of the component's configuration.
    fn config(&self) -> serde_json::Value;
}
