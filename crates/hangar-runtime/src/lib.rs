//! # Hangar Runtime - Layered Environment Orchestration
//!
//! Brings a set of interdependent components (containers, seeders, local
//! processes) up in dependency order, tears them down in reverse, and
//! reports their status.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                         Environment                           │
//! │                                                               │
//! │   layer 0  [ db ]  [ cache ]       ── start first, stop last  │
//! │   layer 1  [ seed ]                                           │
//! │   layer 2  [ api ]  [ worker ]     ── start last, stop first  │
//! │                                                               │
//! │   fan-out per layer ─▶ join ─▶ next layer                     │
//! └───────────────────────────┬───────────────────────────────────┘
//!                             │ Writer (one per component)
//!                             ▼
//!                      OutputManager ─▶ Reader(s)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hangar_runtime::{ComponentGraph, Environment};
//! use tokio_util::sync::CancellationToken;
//!
//! let ctx = CancellationToken::new();
//! let graph = ComponentGraph::new()
//!     .add_layer([("db", postgres)])
//!     .add_layer([("seed", seeder)]);
//!
//! let env = Environment::builder("dev stack")
//!     .graph(graph)
//!     .log_fn(|msg| println!("{msg}"))
//!     .build(&ctx)
//!     .await?;
//!
//! env.apply(&ctx, ["db", "seed"]).await?;
//! let snapshot = env.status(&ctx).await?;
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod component;
pub mod config;
pub mod environment;
pub mod error;
mod fanout;
pub mod graph;
pub mod shared;
pub mod snapshot;
pub mod status;

// Re-export main types
pub use component::{noop_log_fn, Component, ComponentError, EnvironmentHandle, LogFn};
pub use config::{ConfigError, RuntimeConfig};
pub use environment::{Environment, EnvironmentBuilder};
pub use error::{EnvironmentError, Result, Verb};
pub use graph::{ComponentGraph, Layer};
pub use shared::SharedResource;
pub use snapshot::{ComponentSnapshot, StatusSnapshot};
pub use status::{AtomicStatus, ComponentStatus};

// Output types components and callers deal with directly
pub use hangar_output::{LogLine, Reader, Writer};
