//! Lifecycle Sequencer
//!
//! Drives every instance through `init`, `start`, `shutdown` and `uninit`.
//!
//! Forward phases run in declaration order and stop at the first failure,
//! after which everything already brought up is unwound in reverse. Teardown
//! phases run in reverse declaration order and never stop early: every
//! failure is collected and reported once teardown is complete.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use hive_core::{ComponentState, Context, Identity, Instance, Phase, StopHandle};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::graph::ComponentGraph;

/// A hook returned an error.
#[derive(Debug)]
pub struct HookFailure {
    pub component: Identity,
    pub phase: Phase,
    pub cause: anyhow::Error,
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} failed: {:#}", self.phase, self.component, self.cause)
    }
}

fn list(failures: &[HookFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn unwind_suffix(unwind: &[HookFailure]) -> String {
    if unwind.is_empty() {
        String::new()
    } else {
        format!(" (unwind: {})", list(unwind))
    }
}

/// A forward phase failed. Carries the failures of the unwind that followed.
#[derive(Debug, Error)]
#[error("{failure}{}", unwind_suffix(.unwind))]
pub struct LifecycleError {
    pub failure: HookFailure,
    pub unwind: Vec<HookFailure>,
}

/// Teardown completed with failures.
#[derive(Debug, Error)]
#[error("teardown finished with {} failure(s): {}", .failures.len(), list(.failures))]
pub struct TeardownError {
    pub failures: Vec<HookFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Starting,
    Started,
    Stopping,
    Stopped,
}

fn notices(phase: Phase) -> (&'static str, &'static str) {
    match phase {
        Phase::Init => ("initializing", "initialized"),
        Phase::Start => ("starting", "started"),
        Phase::Shutdown => ("shutting down", "shut down"),
        Phase::Uninit => ("uninitializing", "uninitialized"),
    }
}

/// Runs lifecycle phases across a resolved graph.
pub struct Sequencer {
    instances: Vec<Arc<dyn Instance>>,
    states: Mutex<Vec<ComponentState>>,
    stage: Mutex<Stage>,
    shutdown_timeout: Duration,
    stop: StopHandle,
}

impl Sequencer {
    /// Create a sequencer.
    ///
    /// # Arguments
    ///
    /// * `graph` - The resolved components.
    /// * `shutdown_timeout` - Deadline given to each `shutdown` and `uninit` hook.
    /// * `stop` - Stop signal observed by hooks and by [`Sequencer::run_until`].
    pub fn new(graph: ComponentGraph, shutdown_timeout: Duration, stop: StopHandle) -> Self {
        let instances = graph.into_nodes();
        let states = vec![ComponentState::Created; instances.len()];
        Self {
            instances,
            states: Mutex::new(states),
            stage: Mutex::new(Stage::Idle),
            shutdown_timeout,
            stop,
        }
    }

    pub fn stop_handle(&self) -> &StopHandle {
        &self.stop
    }

    /// Instances in declaration order.
    pub fn instances(&self) -> &[Arc<dyn Instance>] {
        &self.instances
    }

    /// Identity and current state of every instance, in declaration order.
    pub fn states(&self) -> Vec<(Identity, ComponentState)> {
        let states = self.states.lock();
        self.instances
            .iter()
            .zip(states.iter())
            .map(|(instance, state)| (instance.identity().clone(), *state))
            .collect()
    }

    fn set_state(&self, index: usize, state: ComponentState) {
        self.states.lock()[index] = state;
    }

    fn set_all(&self, state: ComponentState) {
        self.states.lock().iter_mut().for_each(|s| *s = state);
    }

    fn advance(&self, from: &[Stage], to: Stage) -> Result<(), Error> {
        let mut stage = self.stage.lock();
        if !from.contains(&*stage) {
            return Err(Error::InvalidState(format!(
                "cannot move from {:?} to {to:?}",
                *stage
            )));
        }
        *stage = to;
        Ok(())
    }

    async fn invoke(&self, index: usize, phase: Phase, ctx: &Context) -> Result<(), HookFailure> {
        let instance = &self.instances[index];
        let identity = instance.identity();
        let (before, after) = notices(phase);

        info!(
            component = %identity.name,
            uuid = %identity.uuid,
            phase = %phase,
            "{before} component {identity}"
        );
        let result = match phase {
            Phase::Init => instance.init(ctx).await,
            Phase::Start => instance.start(ctx).await,
            Phase::Shutdown => instance.shutdown(ctx).await,
            Phase::Uninit => instance.uninit(ctx).await,
        };

        match result {
            Ok(()) => {
                info!(
                    component = %identity.name,
                    uuid = %identity.uuid,
                    phase = %phase,
                    "component {identity} {after}"
                );
                Ok(())
            }
            Err(cause) => {
                if phase.is_forward() {
                    error!(
                        component = %identity.name,
                        uuid = %identity.uuid,
                        phase = %phase,
                        error = %format!("{cause:#}"),
                        "component {identity} failed"
                    );
                } else {
                    warn!(
                        component = %identity.name,
                        uuid = %identity.uuid,
                        phase = %phase,
                        error = %format!("{cause:#}"),
                        "component {identity} failed"
                    );
                }
                Err(HookFailure {
                    component: identity.clone(),
                    phase,
                    cause,
                })
            }
        }
    }

    /// Indices of the instances whose state satisfies `keep`, last first.
    fn reversed_where(&self, keep: fn(&ComponentState) -> bool) -> Vec<usize> {
        let states = self.states.lock();
        (0..states.len()).rev().filter(|&i| keep(&states[i])).collect()
    }

    /// Shut down every started instance, then uninit every initialized one,
    /// both in reverse order.
    async fn teardown(&self) -> Vec<HookFailure> {
        let mut failures = Vec::new();

        for index in self.reversed_where(ComponentState::is_started) {
            self.set_state(index, ComponentState::ShuttingDown);
            let ctx = self.stop.context().with_timeout(self.shutdown_timeout);
            if let Err(failure) = self.invoke(index, Phase::Shutdown, &ctx).await {
                failures.push(failure);
            }
        }

        for index in self.reversed_where(ComponentState::is_initialized) {
            let ctx = self.stop.context().with_timeout(self.shutdown_timeout);
            if let Err(failure) = self.invoke(index, Phase::Uninit, &ctx).await {
                failures.push(failure);
            }
            self.set_state(index, ComponentState::Uninitialized);
        }

        self.set_all(ComponentState::Terminated);
        failures
    }

    /// Run `init` then `start` on every instance.
    ///
    /// On failure, started instances are shut down and initialized instances
    /// uninitialized, in reverse order, before the error is returned.
    pub async fn start(&self) -> Result<(), Error> {
        self.advance(&[Stage::Idle], Stage::Starting)?;
        let ctx = self.stop.context();
        let count = self.instances.len();

        for index in 0..count {
            if let Err(failure) = self.invoke(index, Phase::Init, &ctx).await {
                let unwind = self.teardown().await;
                *self.stage.lock() = Stage::Stopped;
                return Err(LifecycleError { failure, unwind }.into());
            }
            self.set_state(index, ComponentState::Initialized);
        }

        for index in 0..count {
            if let Err(failure) = self.invoke(index, Phase::Start, &ctx).await {
                let unwind = self.teardown().await;
                *self.stage.lock() = Stage::Stopped;
                return Err(LifecycleError { failure, unwind }.into());
            }
            self.set_state(index, ComponentState::Started);
        }

        self.set_all(ComponentState::Running);
        self.advance(&[Stage::Starting], Stage::Started)?;
        info!(components = count, "all components started");
        Ok(())
    }

    /// Run `shutdown` then `uninit` on every instance, in reverse order.
    ///
    /// Every hook is invoked even when earlier ones fail. Stopping an already
    /// stopped sequencer does nothing.
    pub async fn stop(&self) -> Result<(), Error> {
        {
            let mut stage = self.stage.lock();
            match *stage {
                Stage::Started => *stage = Stage::Stopping,
                Stage::Stopped => return Ok(()),
                other => {
                    return Err(Error::InvalidState(format!(
                        "cannot stop while {other:?}"
                    )))
                }
            }
        }

        let count = self.instances.len();
        let failures = self.teardown().await;
        *self.stage.lock() = Stage::Stopped;

        if failures.is_empty() {
            info!(components = count, "all components stopped");
            Ok(())
        } else {
            Err(TeardownError { failures }.into())
        }
    }

    /// Start everything, wait for `trigger` or a stop request, then stop.
    pub async fn run_until<F>(&self, trigger: F) -> Result<(), Error>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;

        let ctx = self.stop.context();
        tokio::select! {
            _ = trigger => info!("termination trigger fired"),
            _ = ctx.stopped() => info!("stop requested"),
        }

        self.stop().await
    }
}
