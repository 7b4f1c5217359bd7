//! The transaction runner.

use super::TransactionSource;
use crate::config::RunnerConfig;
use crate::error::{CoreError, CoreResult};
use crate::op::Op;
use crate::store::DocumentStore;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Commits transactions against a document store, retrying on contention.
///
/// The runner holds no per-transaction state; one runner can serve any
/// number of concurrent callers.
#[derive(Clone)]
pub struct Runner {
    store: Arc<dyn DocumentStore>,
    config: RunnerConfig,
}

impl Runner {
    /// Creates a runner over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: RunnerConfig) -> Self {
        Self { store, config }
    }

    /// The store transactions are committed to.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// The runner's configuration.
    #[must_use]
    pub const fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs a transaction to completion.
    ///
    /// `source` is asked for a batch with attempt numbers 1, 2, ... until a
    /// batch commits, the source returns an empty batch, or the retry budget
    /// is used up.
    ///
    /// # Errors
    ///
    /// - any error from `source` is returned immediately
    /// - [`CoreError::ExcessiveContention`] once every attempt was aborted
    /// - any commit error other than [`CoreError::Aborted`] is returned
    ///   immediately
    pub fn run<S: TransactionSource>(&self, mut source: S) -> Result<(), S::Error> {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let ops = source.build(attempt)?;
            if ops.is_empty() {
                debug!(attempt, "transaction has nothing to do");
                return Ok(());
            }

            match self.store.apply(&ops) {
                Ok(()) => {
                    debug!(attempt, ops = ops.len(), "transaction committed");
                    return Ok(());
                }
                Err(CoreError::Aborted { reason }) => {
                    debug!(attempt, %reason, "transaction aborted, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(CoreError::ExcessiveContention {
            attempts: max_attempts,
        }
        .into())
    }

    /// Commits a fixed batch once, with no retry.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Aborted`] if a precondition failed, or any other
    /// commit error.
    pub fn run_transaction(&self, ops: &[Op]) -> CoreResult<()> {
        if ops.is_empty() {
            return Ok(());
        }
        self.store.apply(ops)
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
