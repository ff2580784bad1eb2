//! Host-level error types.
//!
//! Every failure the host reports to its caller is a [`HostError`]. The
//! engine and resolver collaborators have their own error types
//! ([`EngineError`], [`ResolveError`]) which are carried as sources.

use thiserror::Error;

pub use crate::engine::EngineError;
pub use crate::net::resolver::ResolveError;
use crate::lifecycle::HostLifecycleState;

/// Errors surfaced by [`HttpHost`](crate::HttpHost) operations.
#[derive(Debug, Error)]
pub enum HostError {
    /// An operation was invoked in a lifecycle state that does not permit it.
    #[error("lifecycle violation: {0}")]
    LifecycleViolation(#[from] LifecycleViolation),

    /// Bind addresses could not be resolved for the configured host name.
    #[error("failed to resolve bind addresses for `{host}`: {source}")]
    ResolutionFailure {
        host: String,
        #[source]
        source: ResolveError,
    },

    /// The engine could not be built, bound or started.
    #[error("engine failed to start: {0}")]
    EngineStartFailure(#[source] EngineError),

    /// The engine reported an error while shutting down.
    #[error("engine failed to stop: {0}")]
    EngineStopFailure(#[source] EngineError),

    /// The start token was cancelled before the engine was running.
    #[error("start cancelled while {0}")]
    Cancelled(StartPhase),
}

impl HostError {
    /// Returns true for [`HostError::LifecycleViolation`].
    pub fn is_lifecycle_violation(&self) -> bool {
        matches!(self, HostError::LifecycleViolation(_))
    }
}

/// The specific rule a caller broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LifecycleViolation {
    /// `register` after the registry was sealed by `start`.
    #[error("handlers cannot be registered once the host has started")]
    RegisterAfterStart,

    /// `start` on an instance that already left `NotStarted`.
    #[error("host cannot be started from state {state}")]
    AlreadyStarted { state: HostLifecycleState },
}

/// The part of `start` that was interrupted by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPhase {
    Resolving,
    StartingEngine,
}

impl std::fmt::Display for StartPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartPhase::Resolving => write!(f, "resolving bind addresses"),
            StartPhase::StartingEngine => write!(f, "starting the engine"),
        }
    }
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = HostError::from(LifecycleViolation::RegisterAfterStart);
        assert!(err.is_lifecycle_violation());
        assert_eq!(
            err.to_string(),
            "lifecycle violation: handlers cannot be registered once the host has started"
        );

        let err = HostError::from(LifecycleViolation::AlreadyStarted {
            state: HostLifecycleState::Running,
        });
        assert_eq!(
            err.to_string(),
            "lifecycle violation: host cannot be started from state running"
        );

        let err = HostError::Cancelled(StartPhase::Resolving);
        assert!(!err.is_lifecycle_violation());
        assert_eq!(err.to_string(), "start cancelled while resolving bind addresses");
    }
}
