//! # Environment - The Orchestrator
//!
//! Owns an ordered set of layers, a flat name index and the output manager,
//! and drives component lifecycles through them.
//!
//! ## Phases
//!
//! ```text
//! apply(enabled)
//!   ├─ prepare:     all layers at once ── prepare enabled, inactive components
//!   └─ start/stop:  layer 0 ─▶ layer 1 ─▶ … ─▶ layer N
//!                   (per layer, concurrently: start enabled, stop the rest)
//!
//! stop_all          layer N ─▶ … ─▶ layer 0 (stop everything)
//! cleanup           all layers at once
//! ```
//!
//! A failure inside a layer stops the walk: later layers are never touched
//! and nothing already changed is rolled back.
//!
//! ## Concurrency
//!
//! The layer structure and index never change after construction and are
//! read without locks. Operations are not serialized against each other: two
//! overlapping calls can both observe a component as stopped and both start
//! it. Components that care use [`AtomicStatus`](crate::AtomicStatus) to make
//! that decision atomically on their side.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use hangar_output::{OutputManager, Reader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::component::{noop_log_fn, Component, EnvironmentHandle, LogFn};
use crate::config::RuntimeConfig;
use crate::error::{EnvironmentError, Result, Verb};
use crate::fanout::{fan_out, Action, Task};
use crate::graph::{ComponentGraph, Layer};
use crate::snapshot::{ComponentSnapshot, StatusSnapshot};

/// Builder for an [`Environment`] with optional settings.
pub struct EnvironmentBuilder {
    id: String,
    graph: Option<ComponentGraph>,
    log: LogFn,
    config: RuntimeConfig,
}

impl EnvironmentBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            graph: None,
            log: noop_log_fn(),
            config: RuntimeConfig::default(),
        }
    }

    #[must_use]
    pub fn graph(mut self, graph: ComponentGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    /// Callback receiving orchestration progress messages.
    #[must_use]
    pub fn log_fn(mut self, log: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.log = Arc::new(log);
        self
    }

    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate the graph and attach every component.
    pub async fn build(self, ctx: &CancellationToken) -> Result<Environment> {
        self.config.validate()?;

        if self.id.is_empty() {
            return Err(EnvironmentError::EmptyId);
        }
        let id = self.id.replace(' ', "_");
        let graph = self
            .graph
            .ok_or_else(|| EnvironmentError::MissingGraph(id.clone()))?;

        let layers = graph.into_layers();
        let index = build_index(&layers)?;

        let output = OutputManager::with_capacity(self.config.reader_capacity);
        let handle = EnvironmentHandle::new(&id, self.log);

        for layer in &layers {
            for (name, component) in layer {
                component
                    .attach_environment(ctx, handle.clone(), output.writer(name.as_str()))
                    .await
                    .map_err(|e| EnvironmentError::operation(name, Verb::Attach, e))?;
            }
        }

        info!(
            environment = %id,
            layers = layers.len(),
            components = index.len(),
            "Environment ready"
        );

        Ok(Environment {
            id,
            layers,
            index,
            output,
            handle,
        })
    }
}

/// Check every name and build the flat index.
fn build_index(layers: &[Layer]) -> Result<HashMap<String, Arc<dyn Component>>> {
    let mut index = HashMap::new();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();

    for (layer_no, layer) in layers.iter().enumerate() {
        for (name, component) in layer {
            if name.is_empty() {
                return Err(EnvironmentError::EmptyName { layer: layer_no });
            }
            if name.contains(' ') || name.contains('|') {
                return Err(EnvironmentError::InvalidName {
                    name: name.clone(),
                    layer: layer_no,
                });
            }
            if let Some(&first_layer) = first_seen.get(name.as_str()) {
                return Err(EnvironmentError::DuplicateName {
                    name: name.clone(),
                    first_layer,
                    layer: layer_no,
                });
            }
            first_seen.insert(name, layer_no);
            index.insert(name.clone(), Arc::clone(component));
        }
    }

    Ok(index)
}

/// A controllable set of layered components.
pub struct Environment {
    id: String,
    layers: Vec<Layer>,
    index: HashMap<String, Arc<dyn Component>>,
    output: OutputManager,
    handle: EnvironmentHandle,
}

impl Environment {
    /// Build an environment with default settings.
    ///
    /// `graph` is required; `None` is rejected like an empty id.
    pub async fn new(
        ctx: &CancellationToken,
        id: &str,
        graph: Option<ComponentGraph>,
    ) -> Result<Self> {
        let mut builder = EnvironmentBuilder::new(id);
        builder.graph = graph;
        builder.build(ctx).await
    }

    pub fn builder(id: impl Into<String>) -> EnvironmentBuilder {
        EnvironmentBuilder::new(id)
    }

    /// Normalized id (spaces replaced with underscores).
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Handle components receive at attach time.
    #[must_use]
    pub fn handle(&self) -> &EnvironmentHandle {
        &self.handle
    }

    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Registered names, in layer order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.layers
            .iter()
            .flatten()
            .map(|(name, _)| name.as_str())
    }

    /// Look up a component by name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&Arc<dyn Component>> {
        self.index.get(name)
    }

    fn lookup(&self, name: &str) -> Result<&Arc<dyn Component>> {
        self.index
            .get(name)
            .ok_or_else(|| EnvironmentError::ComponentNotFound(name.to_string()))
    }

    /// Bring the environment to the given enabled set.
    ///
    /// Prepares every enabled, inactive component across all layers at
    /// once, then walks the layers in order: enabled components that are not
    /// active are started, every other component is stopped. The first
    /// failure aborts the walk.
    #[instrument(skip_all, fields(environment = %self.id))]
    pub async fn apply<I, S>(&self, ctx: &CancellationToken, enabled: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let enabled: HashSet<String> = enabled
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect();

        for name in &enabled {
            if !self.index.contains_key(name) {
                warn!(component = %name, "Enabled name is not registered, ignoring");
            }
        }

        info!(enabled = enabled.len(), "Applying component set");

        let prepare = self
            .layers
            .iter()
            .flatten()
            .filter(|(name, _)| enabled.contains(name))
            .map(|(name, component)| Task::new(name, Action::Prepare, component))
            .collect();
        fan_out(ctx, &self.handle, prepare).await?;

        for (layer_no, layer) in self.layers.iter().enumerate() {
            debug!(layer = layer_no, "Applying layer");
            let tasks = layer
                .iter()
                .map(|(name, component)| {
                    let action = if enabled.contains(name) {
                        Action::Start
                    } else {
                        Action::Stop
                    };
                    Task::new(name, action, component)
                })
                .collect();
            fan_out(ctx, &self.handle, tasks).await?;
        }

        info!("Component set applied");
        Ok(())
    }

    /// Enable every registered component.
    pub async fn start_all(&self, ctx: &CancellationToken) -> Result<()> {
        let names: Vec<&str> = self.component_names().collect();
        self.apply(ctx, names).await
    }

    /// Stop every component, last layer first.
    #[instrument(skip_all, fields(environment = %self.id))]
    pub async fn stop_all(&self, ctx: &CancellationToken) -> Result<()> {
        info!("Stopping all components");
        for (layer_no, layer) in self.layers.iter().enumerate().rev() {
            debug!(layer = layer_no, "Stopping layer");
            let tasks = layer
                .iter()
                .map(|(name, component)| Task::new(name, Action::Stop, component))
                .collect();
            fan_out(ctx, &self.handle, tasks).await?;
        }
        Ok(())
    }

    /// Prepare and start one component, unless it is already active.
    ///
    /// Dependencies in earlier layers are not considered.
    #[instrument(skip(self, ctx), fields(environment = %self.id))]
    pub async fn start_component(&self, ctx: &CancellationToken, name: &str) -> Result<()> {
        let component = self.lookup(name)?;

        let status = component
            .status(ctx)
            .await
            .map_err(|e| EnvironmentError::operation(name, Verb::Status, e))?;
        if status.is_active() {
            debug!(%status, "Already active, nothing to do");
            return Ok(());
        }

        for action in [Action::Prepare, Action::Start] {
            action
                .invoke(name, component.as_ref(), ctx, &self.handle)
                .await
                .map_err(|e| EnvironmentError::operation(name, action.verb(), e))?;
        }
        Ok(())
    }

    /// Stop one component.
    #[instrument(skip(self, ctx), fields(environment = %self.id))]
    pub async fn stop_component(&self, ctx: &CancellationToken, name: &str) -> Result<()> {
        let component = self.lookup(name)?;
        Action::Stop
            .invoke(name, component.as_ref(), ctx, &self.handle)
            .await
            .map_err(|e| EnvironmentError::operation(name, Verb::Stop, e))
    }

    /// Query every component, one at a time, in graph order.
    pub async fn status(&self, ctx: &CancellationToken) -> Result<StatusSnapshot> {
        let mut layers = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let mut entries = Vec::with_capacity(layer.len());
            for (name, component) in layer {
                let status = component
                    .status(ctx)
                    .await
                    .map_err(|e| EnvironmentError::operation(name, Verb::Status, e))?;
                entries.push(ComponentSnapshot {
                    name: name.clone(),
                    component_type: component.component_type().to_string(),
                    status,
                    config: component.config(),
                });
            }
            layers.push(entries);
        }

        Ok(StatusSnapshot {
            environment: self.id.clone(),
            layers,
        })
    }

    /// Release durable resources of every component, all at once.
    #[instrument(skip_all, fields(environment = %self.id))]
    pub async fn cleanup(&self, ctx: &CancellationToken) -> Result<()> {
        info!("Cleaning up all components");
        let tasks = self
            .layers
            .iter()
            .flatten()
            .map(|(name, component)| Task::new(name, Action::Cleanup, component))
            .collect();
        fan_out(ctx, &self.handle, tasks).await
    }

    /// Subscribe to the combined output, history first.
    pub async fn output(&self) -> Reader {
        self.output.reader().await
    }

    /// The output manager shared by all component writers.
    #[must_use]
    pub fn output_manager(&self) -> &OutputManager {
        &self.output
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let layers: Vec<Vec<&str>> = self
            .layers
            .iter()
            .map(|layer| layer.iter().map(|(name, _)| name.as_str()).collect())
            .collect();
        f.debug_struct("Environment")
            .field("id", &self.id)
            .field("layers", &layers)
            .finish_non_exhaustive()
    }
}
