//! Tasks, task builders and completion handles

use crate::{Problem, Result, Transaction};
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// Identifier of a task within its transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Work executed by a task
///
/// An executable runs exactly once. It publishes its result through
/// [`ExecuteContext::complete`] and may create child tasks through
/// [`ExecuteContext::tasks`]; the task is not considered done until every
/// child is done.
#[async_trait]
pub trait Executable<T>: Send + Sync + 'static
where
    T: Send + 'static,
{
    /// Execute the task
    async fn execute(&self, ctx: &ExecuteContext<T>);
}

type ResultSlot<T> = Arc<Mutex<Option<T>>>;

/// Context handed to a running executable
pub struct ExecuteContext<T> {
    id: TaskId,
    tasks: TaskFactory,
    result: ResultSlot<T>,
}

impl<T: Send + 'static> ExecuteContext<T> {
    /// Identifier of the running task
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Publish the task result
    pub fn complete(&self, value: T) {
        *self.result.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
    }

    /// The transaction the task runs in
    pub fn transaction(&self) -> &Transaction {
        self.tasks.transaction()
    }

    /// Factory for child tasks of the running task
    pub fn tasks(&self) -> &TaskFactory {
        &self.tasks
    }

    /// Report a problem against the transaction
    pub fn report(&self, problem: Problem) {
        self.tasks.transaction().report(problem);
    }
}

/// Creates tasks at the root of a transaction or beneath a running task
#[derive(Clone)]
pub struct TaskFactory {
    transaction: Transaction,
    parent: Option<TaskId>,
}

impl TaskFactory {
    pub(crate) fn root(transaction: Transaction) -> Self {
        Self {
            transaction,
            parent: None,
        }
    }

    pub(crate) fn child(transaction: Transaction, parent: TaskId) -> Self {
        Self {
            transaction,
            parent: Some(parent),
        }
    }

    /// The transaction tasks are created in
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    /// Parent task of created tasks, if any
    pub fn parent(&self) -> Option<TaskId> {
        self.parent
    }

    /// Start building a new task
    pub fn new_task<T, E>(&self, executable: E) -> TaskBuilder<T>
    where
        T: Send + 'static,
        E: Executable<T>,
    {
        TaskBuilder {
            factory: self.clone(),
            name: None,
            executable: Arc::new(executable),
            dependencies: Vec::new(),
        }
    }
}

/// Builder for a task, released into the transaction's schedule
#[must_use = "a task is only scheduled once released"]
pub struct TaskBuilder<T: Send + 'static> {
    factory: TaskFactory,
    name: Option<String>,
    executable: Arc<dyn Executable<T>>,
    dependencies: Vec<TaskId>,
}

impl<T: Send + 'static> TaskBuilder<T> {
    /// Name the task for diagnostics
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Run only after `task` is done
    pub fn add_dependency<U>(mut self, task: &TaskController<U>) -> Self {
        self.dependencies.push(task.id());
        self
    }

    /// Run only after the task with the given id is done
    pub fn add_dependency_id(mut self, id: TaskId) -> Self {
        self.dependencies.push(id);
        self
    }

    /// Run only after every listed task is done
    pub fn add_dependencies(mut self, ids: impl IntoIterator<Item = TaskId>) -> Self {
        self.dependencies.extend(ids);
        self
    }

    /// Release the task into the schedule
    pub fn release(self) -> Result<TaskController<T>> {
        let result: ResultSlot<T> = Arc::new(Mutex::new(None));
        let task = Arc::new(TypedTask {
            executable: self.executable,
            result: result.clone(),
        });
        let name = self.name.unwrap_or_else(|| "task".to_string());
        let id = self.factory.transaction.insert_task(
            name,
            task,
            self.dependencies,
            self.factory.parent,
        )?;
        Ok(TaskController { id, result })
    }
}

/// Typed completion handle of a released task
pub struct TaskController<T> {
    id: TaskId,
    result: ResultSlot<T>,
}

impl<T> TaskController<T> {
    /// Identifier of the task
    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl<T: Clone> TaskController<T> {
    /// Result published by the task, once it has executed
    pub fn result(&self) -> Option<T> {
        self.result
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T> Clone for TaskController<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            result: self.result.clone(),
        }
    }
}

impl<T> fmt::Debug for TaskController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskController").field("id", &self.id).finish()
    }
}

/// Type-erased task as stored in the graph
#[async_trait]
pub(crate) trait ErasedTask: Send + Sync {
    async fn run(&self, id: TaskId, factory: TaskFactory);
}

struct TypedTask<T: Send + 'static> {
    executable: Arc<dyn Executable<T>>,
    result: ResultSlot<T>,
}

#[async_trait]
impl<T: Send + 'static> ErasedTask for TypedTask<T> {
    async fn run(&self, id: TaskId, tasks: TaskFactory) {
        let ctx = ExecuteContext {
            id,
            tasks,
            result: self.result.clone(),
        };
        self.executable.execute(&ctx).await;
    }
}
