//! Service builders

use crate::container::ServiceContainer;
use crate::context::OperationContext;
use crate::controller::ServiceController;
use crate::dependency::{DependencyFlag, DependencySpec};
use crate::error::{Error, Result};
use crate::mode::ServiceMode;
use crate::name::ServiceName;
use crate::service::Service;
use crate::tasks;
use indexmap::{IndexMap, IndexSet};
use service_txn::{TaskController, TaskId, Transaction};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Dependency specs keyed by target name, plus at most one parent
#[derive(Debug, Clone, Default)]
pub(crate) struct DependencySpecs {
    ordinary: IndexMap<ServiceName, DependencySpec>,
    parent: Option<DependencySpec>,
}

impl DependencySpecs {
    /// Add a spec; a later spec for the same name replaces the earlier one
    pub fn add(&mut self, owner: impl fmt::Display, spec: DependencySpec) -> Result<()> {
        if spec.is_parent() {
            if self.parent.is_some() {
                return Err(Error::MultipleParents {
                    owner: owner.to_string(),
                    parent: spec.name().clone(),
                });
            }
            self.ordinary.shift_remove(spec.name());
            self.parent = Some(spec);
            return Ok(());
        }
        if self
            .parent
            .as_ref()
            .is_some_and(|parent| parent.name() == spec.name())
        {
            self.parent = None;
        }
        self.ordinary.insert(spec.name().clone(), spec);
        Ok(())
    }

    pub fn remove(&mut self, name: &ServiceName) {
        self.ordinary.shift_remove(name);
        if self.parent.as_ref().is_some_and(|parent| parent.name() == name) {
            self.parent = None;
        }
    }
}

/// Everything the install task needs, frozen at `build`
pub(crate) struct InstallPlan {
    pub name: ServiceName,
    pub aliases: Vec<ServiceName>,
    pub mode: ServiceMode,
    pub dependencies: Vec<DependencySpec>,
    pub parent: Option<DependencySpec>,
    pub service: Arc<dyn Service>,
    pub replacement: bool,
}

/// Collects the definition of a service and installs it
///
/// Created by [`crate::ServiceTarget::add_service`] or
/// [`crate::ServiceTarget::replace_service`]. Every setter fails once
/// [`ServiceBuilder::build`] has been called.
pub struct ServiceBuilder {
    container: ServiceContainer,
    txn: Transaction,
    name: ServiceName,
    service: Arc<dyn Service>,
    aliases: IndexSet<ServiceName>,
    mode: Option<ServiceMode>,
    specs: DependencySpecs,
    task_dependencies: Vec<TaskId>,
    replacement: bool,
    install_task: Option<TaskController<Option<Arc<ServiceController>>>>,
}

impl ServiceBuilder {
    pub(crate) fn new(
        container: ServiceContainer,
        txn: &Transaction,
        name: ServiceName,
        service: Arc<dyn Service>,
        replacement: bool,
        specs: DependencySpecs,
        task_dependencies: Vec<TaskId>,
    ) -> Self {
        Self {
            container,
            txn: txn.clone(),
            name,
            service,
            aliases: IndexSet::new(),
            mode: None,
            specs,
            task_dependencies,
            replacement,
            install_task: None,
        }
    }

    /// Primary name of the service
    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Whether installing replaces a service already occupying the names
    pub fn is_replacement(&self) -> bool {
        self.replacement
    }

    fn check_not_installed(&self) -> Result<()> {
        if self.install_task.is_some() {
            return Err(Error::BuilderAlreadyInstalled(self.name.clone()));
        }
        Ok(())
    }

    /// Set the service mode
    pub fn set_mode(&mut self, mode: ServiceMode) -> Result<&mut Self> {
        self.check_not_installed()?;
        self.mode = Some(mode);
        Ok(self)
    }

    /// Register the service under additional names
    ///
    /// Duplicates and the primary name itself are ignored.
    pub fn add_aliases<I, N>(&mut self, aliases: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<ServiceName>,
    {
        self.check_not_installed()?;
        for alias in aliases {
            let alias = alias.into();
            if alias != self.name {
                self.aliases.insert(alias);
            }
        }
        Ok(self)
    }

    /// Depend on `name` with default flags
    pub fn add_dependency(&mut self, name: impl Into<ServiceName>) -> Result<&mut Self> {
        self.add_dependency_with_flags(name, &[])
    }

    /// Depend on `name`
    pub fn add_dependency_with_flags(
        &mut self,
        name: impl Into<ServiceName>,
        flags: &[DependencyFlag],
    ) -> Result<&mut Self> {
        self.check_not_installed()?;
        self.specs.add(
            format_args!("Service {}", self.name),
            DependencySpec::new(name.into(), flags),
        )?;
        Ok(self)
    }

    /// Install only after `task` is done
    pub fn add_task_dependency<T>(&mut self, task: &TaskController<T>) -> Result<&mut Self> {
        self.check_not_installed()?;
        self.task_dependencies.push(task.id());
        Ok(self)
    }

    /// Schedule installation
    ///
    /// A replacing builder first tells every dependent of the affected
    /// names that a replacement started, then requests removal of the
    /// current occupants; installation waits for those removals.
    pub fn build(&mut self) -> Result<TaskController<Option<Arc<ServiceController>>>> {
        self.check_not_installed()?;
        let op = OperationContext::root(self.container.clone(), &self.txn);

        let mut after = self.task_dependencies.clone();
        if self.replacement {
            after.extend(self.start_replacement(&op)?);
        }

        let plan = Arc::new(InstallPlan {
            name: self.name.clone(),
            aliases: self.aliases.iter().cloned().collect(),
            mode: self
                .mode
                .unwrap_or(self.container.config().default_mode),
            dependencies: self.specs.ordinary.values().cloned().collect(),
            parent: self.specs.parent.clone(),
            service: self.service.clone(),
            replacement: self.replacement,
        });
        let task = tasks::install::schedule(&op, plan, after)?;
        debug!(
            "Scheduled installation of {} in transaction {}",
            self.name,
            self.txn.id()
        );
        self.install_task = Some(task.clone());
        Ok(task)
    }

    fn start_replacement(&self, op: &OperationContext) -> Result<Vec<TaskId>> {
        let mut removals = Vec::new();
        let mut replaced = Vec::new();
        for name in std::iter::once(&self.name).chain(self.aliases.iter()) {
            let registration = self.container.registry().get_or_create(name);
            for edge in registration.incoming() {
                edge.replacement_started(op)?;
            }
            if let Some(current) = registration.controller() {
                if !replaced.contains(&current.id()) {
                    debug!("Replacing {} with a new {}", current.name(), self.name);
                    replaced.push(current.id());
                    removals.push(current.remove(op)?);
                }
            }
        }
        Ok(removals)
    }

    /// Remove the controller this builder installed, if it installed one
    ///
    /// Returns the task completing the removal.
    pub fn remove(&self, txn: &Transaction) -> Result<Option<TaskId>> {
        let controller = self
            .install_task
            .as_ref()
            .and_then(|task| task.result())
            .flatten();
        match controller {
            Some(controller) => {
                let op = OperationContext::root(self.container.clone(), txn);
                controller.remove(&op).map(Some)
            }
            None => {
                debug!("Nothing installed by builder of {}", self.name);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, flags: &[DependencyFlag]) -> DependencySpec {
        DependencySpec::new(ServiceName::parse(name), flags)
    }

    #[test]
    fn test_last_spec_wins() {
        let owner = ServiceName::parse("web");
        let mut specs = DependencySpecs::default();
        specs.add(&owner, spec("db", &[])).unwrap();
        specs.add(&owner, spec("cache", &[])).unwrap();
        specs
            .add(&owner, spec("db", &[DependencyFlag::Unrequired]))
            .unwrap();

        let names: Vec<_> = specs.ordinary.keys().map(ToString::to_string).collect();
        assert_eq!(names, vec!["db", "cache"]);
        assert_eq!(
            specs.ordinary[&ServiceName::parse("db")],
            spec("db", &[DependencyFlag::Unrequired])
        );
    }

    #[test]
    fn test_single_parent() {
        let owner = ServiceName::parse("web.child");
        let mut specs = DependencySpecs::default();
        specs.add(&owner, spec("web", &[])).unwrap();
        specs
            .add(&owner, spec("web", &[DependencyFlag::Parent]))
            .unwrap();
        assert!(specs.ordinary.is_empty());
        assert!(specs.parent.is_some());

        let second = specs.add(&owner, spec("other", &[DependencyFlag::Parent]));
        match second {
            Err(Error::MultipleParents { owner, parent }) => {
                assert_eq!(owner, "web.child");
                assert_eq!(parent, ServiceName::parse("other"));
            }
            other => panic!("Expected MultipleParents, got {other:?}"),
        }

        specs.add(&owner, spec("web", &[])).unwrap();
        assert!(specs.parent.is_none());
        assert_eq!(specs.ordinary.len(), 1);
    }
}
