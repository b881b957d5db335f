//! Operation context threaded through controller operations

use crate::container::ServiceContainer;
use service_txn::{TaskFactory, Transaction};

/// Container plus the factory new tasks are created with
///
/// Administrative calls use a root factory; operations invoked from a
/// running task use that task's factory so scheduled work becomes its
/// children.
#[derive(Clone)]
pub(crate) struct OperationContext {
    container: ServiceContainer,
    tasks: TaskFactory,
}

impl OperationContext {
    pub fn new(container: ServiceContainer, tasks: TaskFactory) -> Self {
        Self { container, tasks }
    }

    pub fn root(container: ServiceContainer, txn: &Transaction) -> Self {
        Self::new(container, txn.task_factory())
    }

    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    pub fn tasks(&self) -> &TaskFactory {
        &self.tasks
    }

    pub fn txn(&self) -> &Transaction {
        self.tasks.transaction()
    }
}
