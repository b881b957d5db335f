//! Error types for transactions

use crate::transaction::{Phase, TransactionId};
use thiserror::Error;

/// Transaction error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The transaction no longer accepts work
    #[error("Transaction {id} is not active (phase: {phase:?})")]
    NotActive {
        /// Transaction
        id: TransactionId,
        /// Phase the transaction is in
        phase: Phase,
    },

    /// The operation is not allowed in the current phase
    #[error("Invalid transaction phase for {operation}: {phase:?}")]
    InvalidPhase {
        /// Attempted operation
        operation: &'static str,
        /// Phase the transaction is in
        phase: Phase,
    },

    /// Another active transaction holds the write lock
    #[error("Resource is write locked by transaction {owner}")]
    LockConflict {
        /// Transaction currently holding the lock
        owner: TransactionId,
    },

    /// Mutation attempted without holding the write lock
    #[error("Resource is not write locked by transaction {0}")]
    NotWriteLocked(TransactionId),

    /// The task graph cannot make progress
    #[error("Transaction {id} stalled with {pending} unfinished tasks")]
    Stalled {
        /// Transaction
        id: TransactionId,
        /// Tasks that never became done
        pending: usize,
    },

    /// Critical problems prevent commit
    #[error("Transaction {id} cannot commit: {critical} critical problem(s) reported")]
    CommitBlocked {
        /// Transaction
        id: TransactionId,
        /// Number of critical problems
        critical: usize,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
