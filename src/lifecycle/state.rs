//! Host lifecycle state machine.
//!
//! # States
//! - NotStarted: registry open, no engine
//! - Starting: registry sealed, resolving and binding
//! - Running: engine serving the frozen route table
//! - Stopping: engine draining
//! - Stopped: engine released (terminal)
//! - Faulted: start failed, nothing held (terminal)
//!
//! # State Transitions
//! ```text
//! NotStarted → Starting: start()
//! Starting → Running: engine started
//! Starting → Faulted: resolution, bind, start failure or cancellation
//! Running → Stopping → Stopped: stop()
//! ```

use std::fmt;

/// Lifecycle state of an [`HttpHost`](crate::HttpHost).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HostLifecycleState {
    #[default]
    NotStarted,
    Starting,
    Running,
    Stopping,
    Stopped,
    Faulted,
}

impl HostLifecycleState {
    /// Terminal states cannot be left; the host is not restartable.
    pub fn is_terminal(self) -> bool {
        matches!(self, HostLifecycleState::Stopped | HostLifecycleState::Faulted)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HostLifecycleState::NotStarted => "not_started",
            HostLifecycleState::Starting => "starting",
            HostLifecycleState::Running => "running",
            HostLifecycleState::Stopping => "stopping",
            HostLifecycleState::Stopped => "stopped",
            HostLifecycleState::Faulted => "faulted",
        }
    }
}

impl fmt::Display for HostLifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
