//! Optimistic transactions with bounded retry.
//!
//! A transaction is described by a [`TransactionSource`]: something that,
//! given the attempt number, reads whatever state it needs and returns the
//! batch of conditional operations to commit. When a commit is rejected
//! because a precondition no longer holds, the [`Runner`] asks the source
//! for a fresh batch, up to the configured number of attempts.

mod runner;

pub use runner::Runner;

use crate::error::CoreError;
use crate::op::Op;

/// Builds the batch for one attempt of a transaction.
///
/// Implemented for any `FnMut(u32) -> Result<Vec<Op>, E>` closure.
pub trait TransactionSource {
    /// Error returned by [`TransactionSource::build`] and by the run as a
    /// whole.
    type Error: From<CoreError>;

    /// Returns the operations for `attempt` (1-based).
    ///
    /// An empty batch ends the transaction successfully without a commit.
    ///
    /// # Errors
    ///
    /// Any error ends the transaction immediately and is returned unchanged.
    fn build(&mut self, attempt: u32) -> Result<Vec<Op>, Self::Error>;
}

impl<F, E> TransactionSource for F
where
    F: FnMut(u32) -> Result<Vec<Op>, E>,
    E: From<CoreError>,
{
    type Error = E;

    fn build(&mut self, attempt: u32) -> Result<Vec<Op>, E> {
        self(attempt)
    }
}
