//! Shared fixtures for the integration tests.
//!
//! [`Probe`] is a scriptable component that records when each lifecycle call
//! begins and ends, so tests can assert on ordering across layers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use hangar_runtime::{
    AtomicStatus, Component, ComponentError, ComponentStatus, EnvironmentHandle, SharedResource,
    Writer,
};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Ordered `"<begin|end>:<verb>:<name>"` entries.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }

    /// Position of an entry, panicking when it is missing.
    pub fn position(&self, entry: &str) -> usize {
        self.entries()
            .iter()
            .position(|e| e == entry)
            .unwrap_or_else(|| panic!("{entry} not recorded in {:?}", self.entries()))
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries().iter().any(|e| e == entry)
    }
}

/// Network-like resource several probes share.
pub struct SharedNetwork {
    pub resource: SharedResource<String>,
    pub creations: Arc<AtomicUsize>,
}

impl SharedNetwork {
    pub fn new() -> Self {
        Self {
            resource: SharedResource::new(),
            creations: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn handle(&self) -> Self {
        Self {
            resource: self.resource.clone(),
            creations: Arc::clone(&self.creations),
        }
    }

    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }
}

pub struct Probe {
    name: String,
    journal: Journal,
    status: AtomicStatus,
    delay: Duration,
    one_shot: bool,
    fail_on: Option<&'static str>,
    banner: Option<String>,
    network: Option<SharedNetwork>,
    writer: OnceLock<Writer>,
}

impl Probe {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            status: AtomicStatus::default(),
            delay: Duration::ZERO,
            one_shot: false,
            fail_on: None,
            banner: None,
            network: None,
            writer: OnceLock::new(),
        }
    }

    /// Sleep this long inside prepare and start.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }

    pub fn failing_on(mut self, verb: &'static str) -> Self {
        self.fail_on = Some(verb);
        self
    }

    /// Write this text to the component's output when started.
    pub fn announcing(mut self, banner: &str) -> Self {
        self.banner = Some(banner.to_string());
        self
    }

    /// Join the shared network during prepare.
    pub fn joining(mut self, network: &SharedNetwork) -> Self {
        self.network = Some(network.handle());
        self
    }

    pub fn into_component(self) -> Arc<dyn Component> {
        Arc::new(self)
    }

    pub fn writer(&self) -> Option<&Writer> {
        self.writer.get()
    }

    async fn step(&self, verb: &'static str) -> Result<(), ComponentError> {
        self.journal.push(format!("begin:{verb}:{}", self.name));
        if matches!(verb, "prepare" | "start") && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.journal.push(format!("end:{verb}:{}", self.name));
        if self.fail_on == Some(verb) {
            return Err(ComponentError::msg(format!("{} refused to {verb}", self.name)));
        }
        Ok(())
    }
}

#[async_trait]
impl Component for Probe {
    fn component_type(&self) -> &str {
        if self.one_shot {
            "task"
        } else {
            "service"
        }
    }

    async fn attach_environment(
        &self,
        _ctx: &CancellationToken,
        _env: EnvironmentHandle,
        writer: Writer,
    ) -> Result<(), ComponentError> {
        let _ = self.writer.set(writer);
        Ok(())
    }

    async fn prepare(&self, _ctx: &CancellationToken) -> Result<(), ComponentError> {
        if let Some(network) = &self.network {
            let creations = Arc::clone(&network.creations);
            network
                .resource
                .get_or_try_init(|| async move {
                    creations.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ComponentError>("hangar_test_net".to_string())
                })
                .await?;
        }
        self.step("prepare").await
    }

    async fn start(&self, _ctx: &CancellationToken) -> Result<(), ComponentError> {
        self.status.store(ComponentStatus::Starting);
        if let Err(e) = self.step("start").await {
            self.status.store(ComponentStatus::Failed);
            return Err(e);
        }
        if let (Some(banner), Some(writer)) = (&self.banner, self.writer.get()) {
            writer.write_string(banner).await;
        }
        let end = if self.one_shot {
            ComponentStatus::Finished
        } else {
            ComponentStatus::Running
        };
        self.status.store(end);
        Ok(())
    }

    async fn stop(&self, _ctx: &CancellationToken) -> Result<(), ComponentError> {
        self.step("stop").await?;
        self.status.store(ComponentStatus::Stopped);
        Ok(())
    }

    async fn cleanup(&self, _ctx: &CancellationToken) -> Result<(), ComponentError> {
        self.step("cleanup").await
    }

    async fn status(&self, _ctx: &CancellationToken) -> Result<ComponentStatus, ComponentError> {
        Ok(self.status.load())
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "one_shot": self.one_shot,
            "delay_ms": self.delay.as_millis() as u64,
        })
    }
}
