//! Transactions: task execution, commit and rollback

use crate::graph::TaskGraph;
use crate::lock::LockedResource;
use crate::task::{ErasedTask, Executable, TaskBuilder, TaskFactory, TaskId};
use crate::{Error, Problem, Result, Severity};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

/// Unique transaction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(Uuid);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Transaction lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Accepting tasks and locks
    Active,
    /// Every task is done; awaiting commit or rollback
    Prepared,
    /// Committed; locks released
    Committed,
    /// Rolled back; snapshots reapplied and locks released
    RolledBack,
}

struct Inner {
    id: TransactionId,
    phase: Mutex<Phase>,
    graph: Mutex<TaskGraph>,
    locked: Mutex<Vec<Arc<dyn LockedResource>>>,
    problems: Mutex<Vec<Problem>>,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to a transaction
///
/// Cloning is cheap; all clones refer to the same transaction.
#[derive(Clone)]
pub struct Transaction {
    inner: Arc<Inner>,
}

impl Transaction {
    /// Create a new active transaction
    pub fn new() -> Self {
        let id = TransactionId(Uuid::new_v4());
        debug!("Created transaction {}", id);
        Self {
            inner: Arc::new(Inner {
                id,
                phase: Mutex::new(Phase::Active),
                graph: Mutex::new(TaskGraph::default()),
                locked: Mutex::new(Vec::new()),
                problems: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Transaction id
    pub fn id(&self) -> TransactionId {
        self.inner.id
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        *guard(&self.inner.phase)
    }

    /// Whether the transaction still accepts tasks and locks
    pub fn is_active(&self) -> bool {
        self.phase() == Phase::Active
    }

    pub(crate) fn ensure_active(&self) -> Result<()> {
        match self.phase() {
            Phase::Active => Ok(()),
            phase => Err(Error::NotActive {
                id: self.id(),
                phase,
            }),
        }
    }

    /// Factory for root tasks
    pub fn task_factory(&self) -> TaskFactory {
        TaskFactory::root(self.clone())
    }

    /// Start building a root task
    pub fn new_task<T, E>(&self, executable: E) -> TaskBuilder<T>
    where
        T: Send + 'static,
        E: Executable<T>,
    {
        self.task_factory().new_task(executable)
    }

    /// Whether the given task is done
    pub fn is_task_done(&self, id: TaskId) -> bool {
        guard(&self.inner.graph).is_done(id)
    }

    /// Report a problem
    pub fn report(&self, problem: Problem) {
        match problem.severity {
            Severity::Info => debug!("Transaction {}: {}", self.id(), problem.message),
            _ => warn!("Transaction {}: {}", self.id(), problem),
        }
        guard(&self.inner.problems).push(problem);
    }

    /// Problems reported so far
    pub fn problems(&self) -> Vec<Problem> {
        guard(&self.inner.problems).clone()
    }

    /// Whether commit is currently allowed by the reported problems
    pub fn can_commit(&self) -> bool {
        self.critical_problems() == 0
    }

    fn critical_problems(&self) -> usize {
        guard(&self.inner.problems)
            .iter()
            .filter(|problem| problem.severity == Severity::Critical)
            .count()
    }

    pub(crate) fn insert_task(
        &self,
        name: String,
        task: Arc<dyn ErasedTask>,
        dependencies: Vec<TaskId>,
        parent: Option<TaskId>,
    ) -> Result<TaskId> {
        self.ensure_active()?;
        let id = guard(&self.inner.graph).insert(name.clone(), task, dependencies, parent);
        trace!("Transaction {} released task {} ({})", self.id(), id, name);
        Ok(id)
    }

    pub(crate) fn register_locked(&self, resource: Arc<dyn LockedResource>) {
        guard(&self.inner.locked).push(resource);
    }

    /// Execute every released task, including tasks created while executing
    ///
    /// Ready tasks are taken in creation order and each batch runs
    /// concurrently. Returns once every task is done.
    pub async fn prepare(&self) -> Result<()> {
        self.ensure_active()?;
        info!("Preparing transaction {}", self.id());

        loop {
            let ready = guard(&self.inner.graph).take_ready();
            if ready.is_empty() {
                let graph = guard(&self.inner.graph);
                let pending = graph.unfinished();
                if pending == 0 {
                    debug!(
                        "Transaction {} executed {} tasks",
                        self.id(),
                        graph.len()
                    );
                    break;
                }
                warn!(
                    "Transaction {} stalled with {} unfinished tasks",
                    self.id(),
                    pending
                );
                return Err(Error::Stalled {
                    id: self.id(),
                    pending,
                });
            }

            let runs = ready.into_iter().map(|ready| {
                let factory = TaskFactory::child(self.clone(), ready.id);
                async move {
                    trace!("Executing task {} ({})", ready.id, ready.name);
                    ready.task.run(ready.id, factory).await;
                    ready.id
                }
            });
            let executed = join_all(runs).await;

            let mut graph = guard(&self.inner.graph);
            for id in executed {
                graph.mark_executed(id);
            }
        }

        *guard(&self.inner.phase) = Phase::Prepared;
        Ok(())
    }

    /// Commit a prepared transaction, releasing every write lock
    pub fn commit(&self) -> Result<()> {
        let phase = self.phase();
        if phase != Phase::Prepared {
            return Err(Error::InvalidPhase {
                operation: "commit",
                phase,
            });
        }
        let critical = self.critical_problems();
        if critical > 0 {
            return Err(Error::CommitBlocked {
                id: self.id(),
                critical,
            });
        }

        let locked = std::mem::take(&mut *guard(&self.inner.locked));
        for resource in &locked {
            resource.unlock();
        }
        *guard(&self.inner.phase) = Phase::Committed;
        info!(
            "Committed transaction {} ({} locked objects released)",
            self.id(),
            locked.len()
        );
        Ok(())
    }

    /// Roll back the transaction
    ///
    /// Every locked object is restored to the snapshot taken when this
    /// transaction first locked it, in reverse locking order, then unlocked.
    pub fn rollback(&self) -> Result<()> {
        let phase = self.phase();
        if !matches!(phase, Phase::Active | Phase::Prepared) {
            return Err(Error::InvalidPhase {
                operation: "rollback",
                phase,
            });
        }
        // Stop accepting new work before reverting.
        *guard(&self.inner.phase) = Phase::RolledBack;

        let locked = std::mem::take(&mut *guard(&self.inner.locked));
        for resource in locked.iter().rev() {
            resource.revert();
        }
        for resource in &locked {
            resource.unlock();
        }
        info!(
            "Rolled back transaction {} ({} locked objects reverted)",
            self.id(),
            locked.len()
        );
        Ok(())
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id())
            .field("phase", &self.phase())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_requires_prepare() {
        let txn = Transaction::new();
        assert!(matches!(
            txn.commit(),
            Err(Error::InvalidPhase {
                operation: "commit",
                phase: Phase::Active
            })
        ));
    }

    #[test]
    fn test_rollback_is_terminal() {
        let txn = Transaction::new();
        txn.rollback().unwrap();
        assert_eq!(txn.phase(), Phase::RolledBack);
        assert!(txn.rollback().is_err());
        assert!(matches!(txn.ensure_active(), Err(Error::NotActive { .. })));
    }

    #[test]
    fn test_critical_problem_blocks_commit() {
        let txn = Transaction::new();
        txn.report(Problem::error("start failed"));
        assert!(txn.can_commit());
        txn.report(Problem::critical("duplicate service"));
        assert!(!txn.can_commit());

        smol::block_on(txn.prepare()).unwrap();
        assert!(matches!(
            txn.commit(),
            Err(Error::CommitBlocked { critical: 1, .. })
        ));
        txn.rollback().unwrap();
    }
}
