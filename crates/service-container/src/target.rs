//! Service targets: builder factories with shared dependencies

use crate::builder::{DependencySpecs, ServiceBuilder};
use crate::container::ServiceContainer;
use crate::dependency::{DependencyFlag, DependencySpec};
use crate::error::Result;
use crate::name::ServiceName;
use crate::service::Service;
use service_txn::{TaskController, TaskId, Transaction};
use std::sync::Arc;

/// Creates service builders
///
/// Dependencies and task dependencies added to a target are added to every
/// builder it creates afterwards.
#[derive(Clone)]
pub struct ServiceTarget {
    container: ServiceContainer,
    specs: DependencySpecs,
    task_dependencies: Vec<TaskId>,
}

impl ServiceTarget {
    pub(crate) fn new(container: ServiceContainer) -> Self {
        Self {
            container,
            specs: DependencySpecs::default(),
            task_dependencies: Vec::new(),
        }
    }

    /// Container services are installed into
    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    /// Start defining a new service; installing over an existing one fails
    pub fn add_service(
        &self,
        txn: &Transaction,
        name: impl Into<ServiceName>,
        service: impl Service,
    ) -> ServiceBuilder {
        self.builder(txn, name.into(), Arc::new(service), false)
    }

    /// Start defining a service that replaces whatever occupies its names
    pub fn replace_service(
        &self,
        txn: &Transaction,
        name: impl Into<ServiceName>,
        service: impl Service,
    ) -> ServiceBuilder {
        self.builder(txn, name.into(), Arc::new(service), true)
    }

    fn builder(
        &self,
        txn: &Transaction,
        name: ServiceName,
        service: Arc<dyn Service>,
        replacement: bool,
    ) -> ServiceBuilder {
        ServiceBuilder::new(
            self.container.clone(),
            txn,
            name,
            service,
            replacement,
            self.specs.clone(),
            self.task_dependencies.clone(),
        )
    }

    /// Make every service built from this target depend on `name`
    pub fn add_dependency(&mut self, name: impl Into<ServiceName>) -> Result<&mut Self> {
        self.add_dependency_with_flags(name, &[])
    }

    /// Make every service built from this target depend on `name`
    pub fn add_dependency_with_flags(
        &mut self,
        name: impl Into<ServiceName>,
        flags: &[DependencyFlag],
    ) -> Result<&mut Self> {
        self.specs
            .add("Service target", DependencySpec::new(name.into(), flags))?;
        Ok(self)
    }

    /// Drop a target-wide dependency
    pub fn remove_dependency(&mut self, name: &ServiceName) -> &mut Self {
        self.specs.remove(name);
        self
    }

    /// Make every installation from this target wait for `task`
    pub fn add_task_dependency<T>(&mut self, task: &TaskController<T>) -> &mut Self {
        self.task_dependencies.push(task.id());
        self
    }

    /// Drop a target-wide task dependency
    pub fn remove_task_dependency(&mut self, task: TaskId) -> &mut Self {
        self.task_dependencies.retain(|id| *id != task);
        self
    }

    /// Target inheriting this target's dependencies
    pub fn sub_target(&self) -> ServiceTarget {
        self.clone()
    }

    /// See [`ServiceContainer::enable_service`]
    pub fn enable_service(&self, txn: &Transaction, name: &ServiceName) -> Result<()> {
        self.container.enable_service(txn, name)
    }

    /// See [`ServiceContainer::disable_service`]
    pub fn disable_service(&self, txn: &Transaction, name: &ServiceName) -> Result<()> {
        self.container.disable_service(txn, name)
    }
}
