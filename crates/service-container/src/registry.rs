//! Registrations: per-name slots holding the installed controller and the
//! edges pointing at the name

use crate::controller::ServiceController;
use crate::dependency::Dependency;
use crate::error::{Error, Result};
use crate::name::ServiceName;
use indexmap::IndexMap;
use service_txn::{Transaction, Transactional, TransactionalObject};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

#[derive(Default)]
struct RegistrationState {
    controller: Option<Arc<ServiceController>>,
    incoming: Vec<Arc<Dependency>>,
}

impl Transactional for RegistrationState {
    type Snapshot = (Option<Arc<ServiceController>>, Vec<Arc<Dependency>>);

    fn take_snapshot(&self) -> Self::Snapshot {
        (self.controller.clone(), self.incoming.clone())
    }

    fn revert(&mut self, (controller, incoming): Self::Snapshot) {
        self.controller = controller;
        self.incoming = incoming;
    }
}

/// Registry slot for one service name
pub struct Registration {
    name: ServiceName,
    state: Arc<TransactionalObject<RegistrationState>>,
}

impl Registration {
    fn new(name: ServiceName) -> Self {
        Self {
            name,
            state: TransactionalObject::new(RegistrationState::default()),
        }
    }

    /// Registered name
    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Controller currently installed under the name
    pub fn controller(&self) -> Option<Arc<ServiceController>> {
        self.state.read(|s| s.controller.clone())
    }

    /// Edges pointing at the name, in binding order
    pub fn incoming(&self) -> Vec<Arc<Dependency>> {
        self.state.read(|s| s.incoming.clone())
    }

    pub(crate) fn set_controller(
        &self,
        txn: &Transaction,
        controller: &Arc<ServiceController>,
    ) -> Result<()> {
        self.state.lock_write(txn)?;
        self.state.write(txn, |s| match &s.controller {
            Some(current) if current.id() != controller.id() => {
                Err(Error::DuplicateService(self.name.clone()))
            }
            _ => {
                s.controller = Some(controller.clone());
                Ok(())
            }
        })??;
        debug!("Registered {} as {}", controller.name(), self.name);
        Ok(())
    }

    pub(crate) fn clear_controller(&self, txn: &Transaction, controller: &ServiceController) -> Result<()> {
        self.state.lock_write(txn)?;
        self.state.write(txn, |s| {
            if s.controller
                .as_ref()
                .is_some_and(|current| current.id() == controller.id())
            {
                s.controller = None;
            }
        })?;
        Ok(())
    }

    pub(crate) fn add_incoming(&self, txn: &Transaction, edge: Arc<Dependency>) -> Result<()> {
        self.state.lock_write(txn)?;
        self.state.write(txn, |s| s.incoming.push(edge))?;
        Ok(())
    }

    pub(crate) fn remove_incoming(&self, txn: &Transaction, edge: &Arc<Dependency>) -> Result<()> {
        self.state.lock_write(txn)?;
        self.state
            .write(txn, |s| s.incoming.retain(|other| !Arc::ptr_eq(other, edge)))?;
        Ok(())
    }
}

/// Name to registration lookup
///
/// Registrations are created on first use and never dropped; what they hold
/// is transactional, their existence is not.
#[derive(Default)]
pub(crate) struct Registry {
    registrations: Mutex<IndexMap<ServiceName, Arc<Registration>>>,
}

impl Registry {
    pub fn get_or_create(&self, name: &ServiceName) -> Arc<Registration> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.clone())
            .or_insert_with(|| Arc::new(Registration::new(name.clone())))
            .clone()
    }

    pub fn get(&self, name: &ServiceName) -> Option<Arc<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Every registration in creation order
    pub fn registrations(&self) -> Vec<Arc<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}
