//! Shutdown coordination for serve loops.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::EngineError;

/// A serve loop task.
pub type ServeTask = JoinHandle<std::io::Result<()>>;

/// How long a serve task may take to wind down once forced shutdown has
/// been signalled before it is aborted outright.
const FORCED_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Shutdown notifications handed to each serve loop.
///
/// Forced shutdown implies graceful shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    graceful: CancellationToken,
    forced: CancellationToken,
}

impl ShutdownSignal {
    /// Resolves once serve loops should stop accepting and drain.
    pub async fn graceful(&self) {
        self.graceful.cancelled().await
    }

    /// Resolves once serve loops must drop every connection now.
    pub async fn forced(&self) {
        self.forced.cancelled().await
    }

    pub fn is_forced(&self) -> bool {
        self.forced.is_cancelled()
    }
}

/// Coordinator for graceful shutdown of tracked serve tasks.
///
/// Each task listens on a [`ShutdownSignal`] from [`Drain::signal`].
/// [`Drain::shutdown`] signals graceful shutdown and waits for the tasks.
/// Once the deadline token is cancelled it signals forced shutdown, waits
/// for the tasks to close their connections and aborts any still running
/// after that. Dropping a `Drain` aborts every task still tracked.
#[derive(Debug)]
pub struct Drain {
    forced: CancellationToken,
    graceful: CancellationToken,
    tasks: Vec<ServeTask>,
}

impl Drain {
    pub fn new() -> Self {
        let forced = CancellationToken::new();
        Self {
            graceful: forced.child_token(),
            forced,
            tasks: Vec::new(),
        }
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            graceful: self.graceful.clone(),
            forced: self.forced.clone(),
        }
    }

    /// Track a spawned serve task.
    pub fn track(&mut self, task: ServeTask) {
        self.tasks.push(task);
    }

    /// Number of tasks still tracked.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Trigger shutdown and wait for every task, gracefully until `deadline`.
    ///
    /// Returns the first serve error, or [`EngineError::DrainTimedOut`] if
    /// the deadline forced the remaining tasks down. Either way every task
    /// has finished when this returns.
    pub async fn shutdown(&mut self, deadline: &CancellationToken) -> Result<(), EngineError> {
        self.graceful.cancel();

        let mut first_error = None;
        let mut pending = std::mem::take(&mut self.tasks).into_iter();
        while let Some(mut task) = pending.next() {
            let joined = tokio::select! {
                biased;
                joined = &mut task => Some(joined),
                _ = deadline.cancelled() => None,
            };
            let error = match joined {
                Some(Ok(Ok(()))) => None,
                Some(Ok(Err(e))) => Some(EngineError::Serve(e)),
                Some(Err(e)) => Some(EngineError::Join(e.to_string())),
                None => {
                    let rest: Vec<ServeTask> = std::iter::once(task).chain(pending).collect();
                    let aborted = rest.len();
                    tracing::warn!(aborted, "Grace period elapsed, forcing serve tasks down");
                    self.force(rest).await;
                    return Err(EngineError::DrainTimedOut { aborted });
                }
            };
            if let Some(e) = error {
                tracing::error!(error = %e, "Serve task ended with error");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn force(&self, tasks: Vec<ServeTask>) {
        self.forced.cancel();
        for mut task in tasks {
            if tokio::time::timeout(FORCED_JOIN_TIMEOUT, &mut task).await.is_err() {
                task.abort();
                let _ = task.await;
            }
        }
    }

    /// Abort every tracked task immediately. Returns how many were aborted.
    pub fn abort(&mut self) -> usize {
        self.forced.cancel();
        let tasks = std::mem::take(&mut self.tasks);
        for task in &tasks {
            task.abort();
        }
        tasks.len()
    }
}

impl Default for Drain {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Drain {
    fn drop(&mut self) {
        self.abort();
    }
}
