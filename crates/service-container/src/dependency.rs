//! Dependency edges from a dependent controller to a named service
//!
//! An edge never owns either end. It names its target and records the id of
//! its dependent; both are looked up through the container when a
//! notification has to be delivered. What the dependent has been told about
//! the target is kept on the edge, which makes repeated up or down
//! notifications harmless and lets an edge hold back an "up" while its target
//! is being replaced.

use crate::context::OperationContext;
use crate::controller::{ControllerId, ServiceController};
use crate::error::Result;
use crate::events::EventKind;
use crate::name::ServiceName;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use service_txn::{TaskId, Transactional, TransactionalObject};
use std::sync::Arc;
use tracing::{debug, trace};

/// Behavior of a single dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyFlag {
    /// The dependency must be up for the dependent to start (default)
    Required,
    /// Never counted as unsatisfied
    Unrequired,
    /// Always up-demand the target, whatever the dependent's mode
    Demanded,
    /// Never forward demand to the target
    Undemanded,
    /// The target is the dependent's parent
    Parent,
}

/// A dependency as declared on a builder, realized into an edge at install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    name: ServiceName,
    flags: IndexSet<DependencyFlag>,
}

impl DependencySpec {
    /// Declare a dependency on `name`
    pub fn new(name: ServiceName, flags: &[DependencyFlag]) -> Self {
        Self {
            name,
            flags: flags.iter().copied().collect(),
        }
    }

    /// Target name
    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Whether this is the parent dependency
    pub fn is_parent(&self) -> bool {
        self.flags.contains(&DependencyFlag::Parent)
    }

    pub(crate) fn create_dependency(&self) -> Arc<Dependency> {
        Arc::new(Dependency {
            target: self.name.clone(),
            flags: self.flags.clone(),
            state: TransactionalObject::new(EdgeState::default()),
        })
    }
}

#[derive(Debug, Clone, Default)]
struct EdgeState {
    dependent: Option<ControllerId>,
    reported_up: bool,
    demanding: bool,
    replacing: bool,
    pending_up: bool,
    counted: Option<ControllerId>,
}

impl Transactional for EdgeState {
    type Snapshot = EdgeState;

    fn take_snapshot(&self) -> EdgeState {
        self.clone()
    }

    fn revert(&mut self, snapshot: EdgeState) {
        *self = snapshot;
    }
}

/// Edge from a dependent controller to the registration of its target
pub struct Dependency {
    target: ServiceName,
    flags: IndexSet<DependencyFlag>,
    state: Arc<TransactionalObject<EdgeState>>,
}

enum Delivery {
    Up,
    Down,
}

impl Dependency {
    /// Name of the depended-upon service
    pub fn target(&self) -> &ServiceName {
        &self.target
    }

    /// Whether the edge carries `flag`
    pub fn has_flag(&self, flag: DependencyFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Whether the target's state counts towards the dependent's
    /// unsatisfied dependencies
    pub fn is_required(&self) -> bool {
        !self.has_flag(DependencyFlag::Unrequired)
    }

    /// Controller the edge belongs to
    pub fn dependent(&self) -> Option<ControllerId> {
        self.state.read(|s| s.dependent)
    }

    /// Whether the edge currently up-demands its target
    pub fn is_demanding(&self) -> bool {
        self.state.read(|s| s.demanding)
    }

    fn occupant(&self, op: &OperationContext) -> Option<Arc<ServiceController>> {
        op.container()
            .registry()
            .get(&self.target)
            .and_then(|registration| registration.controller())
    }

    fn dependent_controller(&self, op: &OperationContext) -> Option<Arc<ServiceController>> {
        self.dependent()
            .and_then(|id| op.container().controller_by_id(id))
    }

    /// Wire the edge to its dependent and to the target registration
    ///
    /// Returns whether the dependent may count the edge as satisfied.
    pub(crate) fn bind(self: &Arc<Self>, op: &OperationContext, dependent: ControllerId) -> Result<bool> {
        let txn = op.txn();
        self.state.lock_write(txn)?;
        let registration = op.container().registry().get_or_create(&self.target);
        registration.add_incoming(txn, self.clone())?;

        let up = match registration.controller() {
            Some(target) => target.is_up_for(txn)?,
            None => false,
        };
        self.state.write(txn, |s| {
            s.dependent = Some(dependent);
            s.reported_up = up;
        })?;
        trace!("Bound dependency on {} (up: {})", self.target, up);

        if self.has_flag(DependencyFlag::Demanded) {
            self.demand(op)?;
        }
        Ok(up || !self.is_required())
    }

    /// Detach the edge from its target, dropping any demand it holds
    pub(crate) fn release(self: &Arc<Self>, op: &OperationContext) -> Result<()> {
        let txn = op.txn();
        self.state.lock_write(txn)?;
        let (demanding, counted) = self.state.write(txn, |s| {
            s.dependent = None;
            s.reported_up = false;
            s.pending_up = false;
            (std::mem::take(&mut s.demanding), s.counted.take())
        })?;

        if let Some(target) = self.occupant(op) {
            if demanding {
                target.up_undemand(op)?;
            }
            if counted == Some(target.id()) {
                target.dependent_stopped(op)?;
            }
        }
        if let Some(registration) = op.container().registry().get(&self.target) {
            registration.remove_incoming(txn, self)?;
        }
        Ok(())
    }

    /// Ask the target to run
    pub(crate) fn demand(&self, op: &OperationContext) -> Result<()> {
        if self.has_flag(DependencyFlag::Undemanded) {
            return Ok(());
        }
        let txn = op.txn();
        self.state.lock_write(txn)?;
        let changed = self.state.write(txn, |s| !std::mem::replace(&mut s.demanding, true))?;
        if changed {
            if let Some(target) = self.occupant(op) {
                target.up_demand(op)?;
            }
        }
        Ok(())
    }

    /// Withdraw the demand placed by [`Dependency::demand`]
    pub(crate) fn undemand(&self, op: &OperationContext) -> Result<()> {
        if self.has_flag(DependencyFlag::Demanded) {
            return Ok(());
        }
        let txn = op.txn();
        self.state.lock_write(txn)?;
        let changed = self.state.write(txn, |s| std::mem::replace(&mut s.demanding, false))?;
        if changed {
            if let Some(target) = self.occupant(op) {
                target.up_undemand(op)?;
            }
        }
        Ok(())
    }

    /// The target went up or down
    ///
    /// Returns the dependent's in-flight transition, if the notification
    /// left one pending.
    pub(crate) fn new_dependency_state(&self, op: &OperationContext, up: bool) -> Result<Option<TaskId>> {
        if !self.is_required() {
            return Ok(None);
        }
        let txn = op.txn();
        self.state.lock_write(txn)?;
        let delivery = self.state.write(txn, |s| {
            if s.dependent.is_none() {
                return None;
            }
            if up {
                if s.replacing {
                    s.pending_up = true;
                    return None;
                }
                (!std::mem::replace(&mut s.reported_up, true)).then_some(Delivery::Up)
            } else {
                s.pending_up = false;
                std::mem::replace(&mut s.reported_up, false).then_some(Delivery::Down)
            }
        })?;
        self.deliver(op, delivery)
    }

    fn deliver(&self, op: &OperationContext, delivery: Option<Delivery>) -> Result<Option<TaskId>> {
        let Some(delivery) = delivery else {
            return Ok(None);
        };
        let Some(dependent) = self.dependent_controller(op) else {
            return Ok(None);
        };
        match delivery {
            Delivery::Up => dependent.dependency_satisfied(op),
            Delivery::Down => dependent.dependency_unsatisfied(op),
        }
    }

    /// The target is about to be replaced; hold back "up" notifications
    pub(crate) fn replacement_started(&self, op: &OperationContext) -> Result<()> {
        let txn = op.txn();
        self.state.lock_write(txn)?;
        self.state.write(txn, |s| s.replacing = true)?;
        if let Some(dependent) = self.dependent_controller(op) {
            debug!(
                "Replacement of {} started for dependent {}",
                self.target,
                dependent.name()
            );
            op.container().emit(
                dependent.name(),
                EventKind::ReplacementStarted {
                    dependency: self.target.clone(),
                },
            );
        }
        Ok(())
    }

    /// The replacement is installed; deliver any held "up"
    pub(crate) fn replacement_concluded(&self, op: &OperationContext) -> Result<Option<TaskId>> {
        let txn = op.txn();
        self.state.lock_write(txn)?;
        let delivery = self.state.write(txn, |s| {
            s.replacing = false;
            let held = std::mem::take(&mut s.pending_up);
            (held && s.dependent.is_some() && !std::mem::replace(&mut s.reported_up, true))
                .then_some(Delivery::Up)
        })?;
        if let Some(dependent) = self.dependent_controller(op) {
            debug!(
                "Replacement of {} concluded for dependent {}",
                self.target,
                dependent.name()
            );
            op.container().emit(
                dependent.name(),
                EventKind::ReplacementConcluded {
                    dependency: self.target.clone(),
                },
            );
        }
        self.deliver(op, delivery)
    }

    /// The dependent came up; count it as running on the target
    pub(crate) fn dependent_up(&self, op: &OperationContext) -> Result<()> {
        if !self.is_required() {
            return Ok(());
        }
        let Some(target) = self.occupant(op) else {
            return Ok(());
        };
        let txn = op.txn();
        self.state.lock_write(txn)?;
        let previous = self.state.write(txn, |s| s.counted.replace(target.id()))?;
        if previous != Some(target.id()) {
            target.dependent_started(op)?;
        }
        Ok(())
    }

    /// The dependent went down; release the running count on the target
    pub(crate) fn dependent_down(&self, op: &OperationContext) -> Result<()> {
        let txn = op.txn();
        self.state.lock_write(txn)?;
        let counted = self.state.write(txn, |s| s.counted.take())?;
        match (counted, self.occupant(op)) {
            (Some(id), Some(target)) if target.id() == id => target.dependent_stopped(op),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependency")
            .field("target", &self.target)
            .field("flags", &self.flags)
            .finish()
    }
}
