//! # Fan-out / Join
//!
//! Runs one lifecycle call per component concurrently and waits for all of
//! them.
//!
//! ```text
//!            ┌──▶ task(db)    ──┐
//! fan_out ───┼──▶ task(cache) ──┼──▶ join: first error by completion order
//!            └──▶ task(queue) ──┘
//! ```
//!
//! All tasks share one child cancellation token. The first failure cancels
//! it so cooperative siblings can bail out early; non-cooperative ones keep
//! running and are still awaited. Dropping the join future before it
//! finishes also cancels the token, since nobody is left to await the tasks.

use std::sync::Arc;

use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::component::{Component, ComponentError, EnvironmentHandle};
use crate::error::{EnvironmentError, Result, Verb};

/// A lifecycle call the executor can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    /// Prepare unless already `starting`/`running`.
    Prepare,
    /// Start unless already `starting`/`running`.
    Start,
    /// Stop unconditionally.
    Stop,
    /// Cleanup unconditionally.
    Cleanup,
}

impl Action {
    pub(crate) fn verb(self) -> Verb {
        match self {
            Self::Prepare => Verb::Prepare,
            Self::Start => Verb::Start,
            Self::Stop => Verb::Stop,
            Self::Cleanup => Verb::Cleanup,
        }
    }

    fn progress(self) -> &'static str {
        match self {
            Self::Prepare => "preparing",
            Self::Start => "starting",
            Self::Stop => "stopping",
            Self::Cleanup => "cleaning up",
        }
    }

    fn skips_active(self) -> bool {
        matches!(self, Self::Prepare | Self::Start)
    }

    /// Run the action, honouring the skip-if-active rule.
    pub(crate) async fn run(
        self,
        name: &str,
        component: &dyn Component,
        ctx: &CancellationToken,
        env: &EnvironmentHandle,
    ) -> std::result::Result<(), (Verb, ComponentError)> {
        if self.skips_active() {
            let status = component
                .status(ctx)
                .await
                .map_err(|e| (Verb::Status, e))?;
            if status.is_active() {
                debug!(component = name, %status, verb = %self.verb(), "Already active, skipping");
                return Ok(());
            }
        }
        self.invoke(name, component, ctx, env)
            .await
            .map_err(|e| (self.verb(), e))
    }

    /// Call the lifecycle method without any status check.
    pub(crate) async fn invoke(
        self,
        name: &str,
        component: &dyn Component,
        ctx: &CancellationToken,
        env: &EnvironmentHandle,
    ) -> std::result::Result<(), ComponentError> {
        env.log(&format!("{} {name}", self.progress()));
        debug!(component = name, verb = %self.verb(), "Invoking component");
        match self {
            Self::Prepare => component.prepare(ctx).await,
            Self::Start => component.start(ctx).await,
            Self::Stop => component.stop(ctx).await,
            Self::Cleanup => component.cleanup(ctx).await,
        }
    }
}

/// One unit of work in a fan-out group.
pub(crate) struct Task {
    pub name: String,
    pub action: Action,
    pub component: Arc<dyn Component>,
}

impl Task {
    pub(crate) fn new(name: &str, action: Action, component: &Arc<dyn Component>) -> Self {
        Self {
            name: name.to_string(),
            action,
            component: Arc::clone(component),
        }
    }
}

/// Run every task concurrently and wait for all of them.
///
/// Returns the first failure in completion order, wrapped with the
/// component's name and verb. Work that already completed is not undone.
pub(crate) async fn fan_out(
    ctx: &CancellationToken,
    env: &EnvironmentHandle,
    tasks: Vec<Task>,
) -> Result<()> {
    if tasks.is_empty() {
        return Ok(());
    }

    let group = ctx.child_token();
    let _abandoned = group.clone().drop_guard();
    let mut pending = FuturesUnordered::new();

    for Task {
        name,
        action,
        component,
    } in tasks
    {
        let token = group.clone();
        let env = env.clone();
        let task_name = name.clone();
        let handle = tokio::spawn(async move {
            action
                .run(&task_name, component.as_ref(), &token, &env)
                .await
        });
        pending.push(handle.map(move |joined| (name, action, joined)));
    }

    let mut first_error = None;
    while let Some((name, action, joined)) = pending.next().await {
        let error = match joined {
            Ok(Ok(())) => continue,
            Ok(Err((verb, source))) => EnvironmentError::operation(&name, verb, source),
            Err(join_error) => EnvironmentError::TaskFailed {
                name,
                verb: action.verb(),
                reason: join_error.to_string(),
            },
        };

        if first_error.is_none() {
            warn!(error = %error, "Component operation failed, cancelling siblings");
            group.cancel();
            first_error = Some(error);
        } else {
            debug!(error = %error, "Additional failure in the same group");
        }
    }

    match first_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}
