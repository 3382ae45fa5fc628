//! # Component Status
//!
//! The closed set of lifecycle states a component reports, plus an atomic
//! cell implementations can use to store it.
//!
//! ```text
//! stopped ──start──▶ starting ──ready──▶ running ──stop──▶ stopped
//!                       │                   │
//!                       └──not ready──▶ failed
//!                                           └──process exited──▶ stopped | finished | failed
//! ```
//!
//! The orchestrator never enforces these transitions. It only treats
//! `starting` and `running` as "already active".

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum ComponentStatus {
    /// Not running.
    #[default]
    Stopped = 0,
    /// Launch underway, readiness not yet confirmed.
    Starting = 1,
    /// Running normally.
    Running = 2,
    /// Failed to start or died unexpectedly.
    Failed = 3,
    /// A one-shot task that completed.
    Finished = 4,
}

impl ComponentStatus {
    /// `starting` or `running`: the orchestrator leaves these alone.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }

    /// Lowercase name, as used in serialized snapshots.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Finished => "finished",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Starting,
            2 => Self::Running,
            3 => Self::Failed,
            4 => Self::Finished,
            _ => Self::Stopped,
        }
    }
}

impl std::fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A [`ComponentStatus`] stored in an atomic.
///
/// Lets an implementation make check-then-act decisions without a lock, e.g.
/// claiming the `stopped -> starting` transition so that two overlapping
/// start calls cannot both launch the workload.
#[derive(Debug, Default)]
pub struct AtomicStatus {
    value: AtomicU8,
}

impl AtomicStatus {
    #[must_use]
    pub fn new(status: ComponentStatus) -> Self {
        Self {
            value: AtomicU8::new(status as u8),
        }
    }

    #[must_use]
    pub fn load(&self) -> ComponentStatus {
        ComponentStatus::from_u8(self.value.load(Ordering::Acquire))
    }

    pub fn store(&self, status: ComponentStatus) {
        self.value.store(status as u8, Ordering::Release);
    }

    /// Replace the status, returning the previous one.
    pub fn swap(&self, status: ComponentStatus) -> ComponentStatus {
        ComponentStatus::from_u8(self.value.swap(status as u8, Ordering::AcqRel))
    }

    /// Set `new` only if the current status is `current`.
    ///
    /// On failure returns the status actually observed.
    pub fn compare_exchange(
        &self,
        current: ComponentStatus,
        new: ComponentStatus,
    ) -> Result<ComponentStatus, ComponentStatus> {
        self.value
            .compare_exchange(current as u8, new as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(ComponentStatus::from_u8)
            .map_err(ComponentStatus::from_u8)
    }

    /// Move to `to` if the current status is one of `from`.
    ///
    /// Returns the status the transition started from, or the observed
    /// status when it was not in `from`.
    pub fn transition(
        &self,
        from: &[ComponentStatus],
        to: ComponentStatus,
    ) -> Result<ComponentStatus, ComponentStatus> {
        let mut observed = self.load();
        loop {
            if !from.contains(&observed) {
                return Err(observed);
            }
            match self.compare_exchange(observed, to) {
                Ok(previous) => return Ok(previous),
                Err(actual) => observed = actual,
            }
        }
    }
}
