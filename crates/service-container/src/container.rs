//! Service container: registry, controller arena and administrative surface

use crate::config::ContainerConfig;
use crate::context::OperationContext;
use crate::controller::{ControllerId, ServiceController};
use crate::error::{Error, Result};
use crate::events::{EventBus, EventKind, LifecycleEvent};
use crate::name::ServiceName;
use crate::registry::{Registration, Registry};
use crate::state::State;
use crate::target::ServiceTarget;
use async_channel::Receiver;
use service_txn::{TaskId, Transaction};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use tracing::info;

struct ContainerInner {
    config: ContainerConfig,
    registry: Registry,
    controllers: Mutex<HashMap<ControllerId, Weak<ServiceController>>>,
    next_id: AtomicU64,
    events: EventBus,
}

/// In-process service container
///
/// Registrations hold the only strong references to controllers. The
/// container keeps weak references keyed by [`ControllerId`] so dependency
/// edges can reach their dependents without owning them. Cloning is cheap.
#[derive(Clone)]
pub struct ServiceContainer {
    inner: Arc<ContainerInner>,
}

impl ServiceContainer {
    /// Create an empty container
    pub fn new(config: ContainerConfig) -> Self {
        info!("Creating service container {}", config.name);
        Self {
            inner: Arc::new(ContainerInner {
                config,
                registry: Registry::default(),
                controllers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                events: EventBus::default(),
            }),
        }
    }

    /// Container configuration
    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// Container name
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Target for building services into this container
    pub fn target(&self) -> ServiceTarget {
        ServiceTarget::new(self.clone())
    }

    /// Receive every lifecycle event from now on
    pub fn subscribe(&self) -> Receiver<LifecycleEvent> {
        self.inner.events.subscribe()
    }

    /// Controller installed under `name` (primary or alias)
    pub fn controller(&self, name: &ServiceName) -> Option<Arc<ServiceController>> {
        self.inner
            .registry
            .get(name)
            .and_then(|registration| registration.controller())
    }

    /// Registration for `name`, if the name was ever used
    pub fn registration(&self, name: &ServiceName) -> Option<Arc<Registration>> {
        self.inner.registry.get(name)
    }

    /// Published state of the service installed under `name`
    pub fn state_of(&self, name: &ServiceName) -> Option<State> {
        self.controller(name).map(|controller| controller.state())
    }

    /// Primary names of every installed service, in registration order
    pub fn service_names(&self) -> Vec<ServiceName> {
        self.controllers()
            .iter()
            .map(|controller| controller.name().clone())
            .collect()
    }

    fn controllers(&self) -> Vec<Arc<ServiceController>> {
        self.inner
            .registry
            .registrations()
            .into_iter()
            .filter_map(|registration| {
                registration
                    .controller()
                    .filter(|controller| controller.name() == registration.name())
            })
            .collect()
    }

    fn with_controller<R>(
        &self,
        txn: &Transaction,
        name: &ServiceName,
        f: impl FnOnce(&Arc<ServiceController>, &OperationContext) -> Result<R>,
    ) -> Result<R> {
        let controller = self
            .controller(name)
            .ok_or_else(|| Error::ServiceNotFound(name.clone()))?;
        f(&controller, &OperationContext::root(self.clone(), txn))
    }

    /// Enable a service
    pub fn enable_service(&self, txn: &Transaction, name: &ServiceName) -> Result<()> {
        self.with_controller(txn, name, |c, op| c.enable(op).map(drop))
    }

    /// Disable a service; if it is up it stops
    pub fn disable_service(&self, txn: &Transaction, name: &ServiceName) -> Result<()> {
        self.with_controller(txn, name, |c, op| c.disable(op).map(drop))
    }

    /// Enable every installed service
    pub fn enable_container(&self, txn: &Transaction) -> Result<()> {
        info!("Enabling container {}", self.name());
        let op = OperationContext::root(self.clone(), txn);
        for controller in self.controllers() {
            controller.enable(&op)?;
        }
        Ok(())
    }

    /// Disable every installed service
    pub fn disable_container(&self, txn: &Transaction) -> Result<()> {
        info!("Disabling container {}", self.name());
        let op = OperationContext::root(self.clone(), txn);
        for controller in self.controllers() {
            controller.disable(&op)?;
        }
        Ok(())
    }

    /// Remove a service, returning the task that completes the removal
    pub fn remove_service(&self, txn: &Transaction, name: &ServiceName) -> Result<TaskId> {
        self.with_controller(txn, name, |c, op| c.remove(op))
    }

    /// Retry a failed service; no effect in any other state
    pub fn retry_service(&self, txn: &Transaction, name: &ServiceName) -> Result<()> {
        self.with_controller(txn, name, |c, op| c.retry(op).map(drop))
    }

    /// Ask a service to run
    pub fn demand_service(&self, txn: &Transaction, name: &ServiceName) -> Result<()> {
        self.with_controller(txn, name, |c, op| c.up_demand(op))
    }

    /// Withdraw a request made with [`ServiceContainer::demand_service`]
    pub fn undemand_service(&self, txn: &Transaction, name: &ServiceName) -> Result<()> {
        self.with_controller(txn, name, |c, op| c.up_undemand(op))
    }

    /// Ask a service to stop
    pub fn demand_service_down(&self, txn: &Transaction, name: &ServiceName) -> Result<()> {
        self.with_controller(txn, name, |c, op| c.down_demand(op))
    }

    /// Withdraw a request made with [`ServiceContainer::demand_service_down`]
    pub fn undemand_service_down(&self, txn: &Transaction, name: &ServiceName) -> Result<()> {
        self.with_controller(txn, name, |c, op| c.down_undemand(op))
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub(crate) fn next_controller_id(&self) -> ControllerId {
        ControllerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub(crate) fn track(&self, controller: &Arc<ServiceController>) {
        let mut controllers = self
            .inner
            .controllers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        controllers.retain(|_, weak| weak.strong_count() > 0);
        controllers.insert(controller.id(), Arc::downgrade(controller));
    }

    pub(crate) fn controller_by_id(&self, id: ControllerId) -> Option<Arc<ServiceController>> {
        self.inner
            .controllers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .and_then(Weak::upgrade)
    }

    pub(crate) fn emit(&self, service: &ServiceName, kind: EventKind) {
        self.inner.events.emit(service, kind);
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}
