//! Transactional objects: write locks with before-image snapshots
//!
//! A [`TransactionalObject`] wraps plain state implementing [`Transactional`].
//! The first time a transaction write-locks the object a snapshot of the state
//! is captured. Commit discards the snapshot; rollback reapplies it. Mutation
//! is only possible through [`TransactionalObject::write`] while the lock is
//! held by the calling transaction.

use crate::{Error, Result, Transaction, TransactionId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::trace;

/// State that can be captured and restored by a transaction
pub trait Transactional: Send + 'static {
    /// Before-image type
    type Snapshot: Send + 'static;

    /// Capture the current state
    fn take_snapshot(&self) -> Self::Snapshot;

    /// Restore a previously captured state
    fn revert(&mut self, snapshot: Self::Snapshot);

    /// Called when a transaction acquires the write lock
    fn write_locked(&mut self) {}

    /// Called when the write lock is released
    fn write_unlocked(&mut self) {}
}

struct Guarded<S: Transactional> {
    state: S,
    owner: Option<TransactionId>,
    snapshot: Option<S::Snapshot>,
}

/// Shared state guarded by a per-transaction write lock
pub struct TransactionalObject<S: Transactional> {
    inner: Mutex<Guarded<S>>,
}

impl<S: Transactional> TransactionalObject<S> {
    /// Wrap the given state
    pub fn new(state: S) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Guarded {
                state,
                owner: None,
                snapshot: None,
            }),
        })
    }

    fn guarded(&self) -> MutexGuard<'_, Guarded<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the write lock for `txn`
    ///
    /// Re-acquisition by the owning transaction is a no-op. Acquisition while
    /// another transaction owns the lock fails with [`Error::LockConflict`].
    pub fn lock_write(self: &Arc<Self>, txn: &Transaction) -> Result<()> {
        txn.ensure_active()?;
        {
            let mut guarded = self.guarded();
            match guarded.owner {
                Some(owner) if owner == txn.id() => return Ok(()),
                Some(owner) => return Err(Error::LockConflict { owner }),
                None => {
                    let snapshot = guarded.state.take_snapshot();
                    guarded.snapshot = Some(snapshot);
                    guarded.owner = Some(txn.id());
                    guarded.state.write_locked();
                }
            }
        }
        trace!("Transaction {} acquired write lock", txn.id());
        txn.register_locked(self.clone());
        Ok(())
    }

    /// Whether `txn` currently holds the write lock
    pub fn is_write_locked_by(&self, txn: &Transaction) -> bool {
        self.guarded().owner == Some(txn.id())
    }

    /// Whether any transaction holds the write lock
    pub fn is_write_locked(&self) -> bool {
        self.guarded().owner.is_some()
    }

    /// Mutate the state; `txn` must hold the write lock
    pub fn write<R>(&self, txn: &Transaction, f: impl FnOnce(&mut S) -> R) -> Result<R> {
        let mut guarded = self.guarded();
        if guarded.owner != Some(txn.id()) {
            return Err(Error::NotWriteLocked(txn.id()));
        }
        Ok(f(&mut guarded.state))
    }

    /// Read the state
    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.guarded().state)
    }
}

/// A locked object as seen by its transaction
pub(crate) trait LockedResource: Send + Sync {
    fn revert(&self);
    fn unlock(&self);
}

impl<S: Transactional> LockedResource for TransactionalObject<S> {
    fn revert(&self) {
        let mut guarded = self.guarded();
        if let Some(snapshot) = guarded.snapshot.take() {
            guarded.state.revert(snapshot);
        }
    }

    fn unlock(&self) {
        let mut guarded = self.guarded();
        guarded.owner = None;
        guarded.snapshot = None;
        guarded.state.write_unlocked();
    }
}
