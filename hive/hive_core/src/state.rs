//! Lifecycle phases and per-instance states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four hooks applied uniformly across all instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Declaration order, fail-fast
    Init,

    /// Declaration order, fail-fast
    Start,

    /// Reverse declaration order, best-effort
    Shutdown,

    /// Reverse declaration order, best-effort
    Uninit,
}

impl Phase {
    /// Get the name of this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Start => "start",
            Self::Shutdown => "shutdown",
            Self::Uninit => "uninit",
        }
    }

    /// Whether this phase brings components up (as opposed to tearing down).
    pub fn is_forward(&self) -> bool {
        matches!(self, Self::Init | Self::Start)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a single instance is in its lifecycle.
///
/// Instances only ever move forward through these states. An instance whose
/// `init` failed stays `Created` until it is marked `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentState {
    /// Constructed, options decoded, references bound
    Created,

    /// `init` returned successfully
    Initialized,

    /// `start` returned successfully
    Started,

    /// Every instance has started and the service is running
    Running,

    /// `shutdown` has been invoked
    ShuttingDown,

    /// `uninit` has been invoked
    Uninitialized,

    /// Teardown is over; the instance will not be called again
    Terminated,
}

impl ComponentState {
    /// Whether the `init` hook completed for this instance.
    pub fn is_initialized(&self) -> bool {
        matches!(
            self,
            Self::Initialized | Self::Started | Self::Running | Self::ShuttingDown
        )
    }

    /// Whether the `start` hook completed for this instance.
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started | Self::Running)
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Initialized => "initialized",
            Self::Started => "started",
            Self::Running => "running",
            Self::ShuttingDown => "shutting-down",
            Self::Uninitialized => "uninitialized",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}
