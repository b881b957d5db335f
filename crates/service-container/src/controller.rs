//! Service controllers
//!
//! A [`ServiceController`] owns the lifecycle of one installed service: its
//! published [`State`], the administrative enable switch, demand and
//! dependency counters, and the bookkeeping of the transition in flight.
//!
//! Every operation first write-locks the controller for the calling
//! transaction. Locking captures a snapshot of the published fields and
//! creates the transactional bookkeeping; rollback restores the snapshot and
//! unlocking drops the bookkeeping again. Decisions are made by the pure
//! functions in [`crate::transition`]; this module only applies them and
//! schedules the resulting tasks. No other object is ever called while the
//! controller's state is borrowed.

use crate::context::OperationContext;
use crate::dependency::{Dependency, DependencyFlag};
use crate::error::{Error, Result};
use crate::events::EventKind;
use crate::mode::{Demand, DemandView, ServiceMode};
use crate::name::ServiceName;
use crate::service::Service;
use crate::state::{State, TransactionalState};
use crate::tasks;
use crate::transition::{self, RemovalPlan, StopPlan, Transition, TransitionInput};
use serde::{Deserialize, Serialize};
use service_txn::{Problem, TaskId, Transaction, Transactional, TransactionalObject};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Stable identifier of a controller within its container
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ControllerId(pub(crate) u64);

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "controller-{}", self.0)
    }
}

/// Published counters of a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControllerCounters {
    /// Dependencies currently not satisfied
    pub unsatisfied_dependencies: usize,
    /// Up-demand reference count
    pub up_demanded_by: usize,
    /// Down-demand reference count
    pub down_demanded_by: usize,
    /// Dependents currently up and relying on this service
    pub running_dependents: usize,
}

/// Bookkeeping that only exists while a transaction holds the write lock
#[derive(Debug)]
struct TransactionalInfo {
    state: TransactionalState,
    completion: Option<TaskId>,
    perform_transition: bool,
    remove_requested: bool,
    removal: Option<TaskId>,
    starts: usize,
}

impl TransactionalInfo {
    fn new(state: State) -> Self {
        Self {
            state: state.into(),
            completion: None,
            perform_transition: false,
            remove_requested: false,
            removal: None,
            starts: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ControllerSnapshot {
    state: State,
    enabled: bool,
    counters: ControllerCounters,
}

struct ControllerState {
    state: State,
    enabled: bool,
    counters: ControllerCounters,
    info: Option<TransactionalInfo>,
}

impl Transactional for ControllerState {
    type Snapshot = ControllerSnapshot;

    fn take_snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            state: self.state,
            enabled: self.enabled,
            counters: self.counters,
        }
    }

    fn revert(&mut self, snapshot: ControllerSnapshot) {
        self.state = snapshot.state;
        self.enabled = snapshot.enabled;
        self.counters = snapshot.counters;
        self.info = None;
    }

    fn write_locked(&mut self) {
        self.info = Some(TransactionalInfo::new(self.state));
    }

    fn write_unlocked(&mut self) {
        self.info = None;
    }
}

impl ControllerState {
    fn info(&mut self, name: &ServiceName) -> Result<&mut TransactionalInfo> {
        self.info
            .as_mut()
            .ok_or_else(|| Error::MissingTransactionalInfo(name.clone()))
    }

    fn transition_input(&self, mode: ServiceMode, name: &ServiceName) -> Result<TransitionInput> {
        let info = self
            .info
            .as_ref()
            .ok_or_else(|| Error::MissingTransactionalInfo(name.clone()))?;
        let demand = DemandView {
            up: self.counters.up_demanded_by,
            down: self.counters.down_demanded_by,
        };
        Ok(TransitionInput {
            state: info.state,
            unsatisfied: self.counters.unsatisfied_dependencies,
            running_dependents: self.counters.running_dependents,
            enabled: self.enabled,
            should_start: mode.should_start(&demand),
            should_stop: mode.should_stop(&demand),
            demand: mode.demand_policy(),
            remove_requested: info.remove_requested,
        })
    }
}

fn decrement(value: &mut usize, service: &ServiceName, counter: &'static str) -> Result<usize> {
    *value = value.checked_sub(1).ok_or_else(|| Error::CounterUnderflow {
        service: service.clone(),
        counter,
    })?;
    Ok(*value)
}

enum RemovalRequest {
    Scheduled(TaskId),
    New {
        plan: RemovalPlan,
        completion: Option<TaskId>,
    },
}

/// Runtime entity owning the lifecycle of one installed service
pub struct ServiceController {
    id: ControllerId,
    name: ServiceName,
    aliases: Vec<ServiceName>,
    dependencies: Vec<Arc<Dependency>>,
    mode: ServiceMode,
    service: Arc<dyn Service>,
    state: Arc<TransactionalObject<ControllerState>>,
}

impl ServiceController {
    pub(crate) fn new(
        id: ControllerId,
        name: ServiceName,
        aliases: Vec<ServiceName>,
        dependencies: Vec<Arc<Dependency>>,
        mode: ServiceMode,
        service: Arc<dyn Service>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            name,
            aliases,
            dependencies,
            mode,
            service,
            state: TransactionalObject::new(ControllerState {
                state: State::Down,
                enabled: false,
                counters: ControllerCounters::default(),
                info: None,
            }),
        })
    }

    /// Controller id
    pub fn id(&self) -> ControllerId {
        self.id
    }

    /// Primary service name
    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Alias names
    pub fn aliases(&self) -> &[ServiceName] {
        &self.aliases
    }

    /// Primary name followed by the aliases
    pub fn names(&self) -> impl Iterator<Item = &ServiceName> {
        std::iter::once(&self.name).chain(self.aliases.iter())
    }

    /// Service mode
    pub fn mode(&self) -> ServiceMode {
        self.mode
    }

    /// Outgoing dependency edges in declaration order
    pub fn dependencies(&self) -> &[Arc<Dependency>] {
        &self.dependencies
    }

    /// Published state
    pub fn state(&self) -> State {
        self.state.read(|s| s.state)
    }

    /// Whether the service is administratively enabled
    pub fn is_enabled(&self) -> bool {
        self.state.read(|s| s.enabled)
    }

    /// Published counters
    pub fn counters(&self) -> ControllerCounters {
        self.state.read(|s| s.counters)
    }

    /// Internal state as seen by the transaction holding the lock, if any
    pub fn transactional_state(&self) -> Option<TransactionalState> {
        self.state.read(|s| s.info.as_ref().map(|info| info.state))
    }

    pub(crate) fn service(&self) -> &Arc<dyn Service> {
        &self.service
    }

    fn lock(&self, txn: &Transaction) -> Result<()> {
        self.state.lock_write(txn)?;
        Ok(())
    }

    fn update<R>(
        &self,
        txn: &Transaction,
        f: impl FnOnce(&mut ControllerState) -> Result<R>,
    ) -> Result<R> {
        self.lock(txn)?;
        self.state.write(txn, f)?
    }

    /// Whether the service is up for the given transaction
    pub(crate) fn is_up_for(&self, txn: &Transaction) -> Result<bool> {
        self.update(txn, |s| Ok(s.info(&self.name)?.state == TransactionalState::Up))
    }

    /// Up and neither stopping nor being removed
    pub(crate) fn is_settled_up(&self, txn: &Transaction) -> Result<bool> {
        self.update(txn, |s| {
            let info = s.info(&self.name)?;
            Ok(info.state == TransactionalState::Up && !info.remove_requested)
        })
    }

    /// Lock the fresh controller and wire its edges
    ///
    /// Demand held by edges already pointing at the controller's names is
    /// adopted, so a replacement inherits the demand of its predecessor.
    pub(crate) fn attach(self: &Arc<Self>, op: &OperationContext) -> Result<()> {
        let txn = op.txn();
        self.lock(txn)?;

        let mut unsatisfied = 0;
        for edge in &self.dependencies {
            if !edge.bind(op, self.id)? {
                unsatisfied += 1;
            }
        }
        let inherited = self
            .names()
            .filter_map(|name| op.container().registry().get(name))
            .flat_map(|registration| registration.incoming())
            .filter(|edge| edge.is_demanding())
            .count();

        self.update(txn, |s| {
            s.counters.unsatisfied_dependencies = unsatisfied;
            s.counters.up_demanded_by = inherited;
            Ok(())
        })?;
        debug!(
            "Attached {} ({} dependencies, {} unsatisfied, {} demands inherited)",
            self.name,
            self.dependencies.len(),
            unsatisfied,
            inherited
        );
        Ok(())
    }

    /// Complete installation: enable the controller and run the first transition
    pub(crate) fn install(self: &Arc<Self>, op: &OperationContext) -> Result<Option<TaskId>> {
        let up_demanded = self.update(op.txn(), |s| {
            s.enabled = true;
            Ok(s.counters.up_demanded_by > 0)
        })?;
        let demand = self.mode.demand_policy();
        if demand == Demand::Always || (demand == Demand::Propagate && up_demanded) {
            tasks::demand::schedule(op, self, Vec::new())?;
        }
        info!("Installed service {} ({:?})", self.name, self.mode);
        op.container().emit(&self.name, EventKind::Installed);
        self.transition(op)
    }

    /// Enable the service
    pub(crate) fn enable(self: &Arc<Self>, op: &OperationContext) -> Result<Option<TaskId>> {
        self.set_enabled(op, true)
    }

    /// Disable the service; an up service stops whatever its demand
    pub(crate) fn disable(self: &Arc<Self>, op: &OperationContext) -> Result<Option<TaskId>> {
        self.set_enabled(op, false)
    }

    fn set_enabled(self: &Arc<Self>, op: &OperationContext, enabled: bool) -> Result<Option<TaskId>> {
        self.update(op.txn(), |s| {
            s.enabled = enabled;
            Ok(())
        })?;
        debug!("Service {} enabled: {}", self.name, enabled);
        self.transition(op)
    }

    /// Move a FAILED service back to DOWN and try again
    pub(crate) fn retry(self: &Arc<Self>, op: &OperationContext) -> Result<Option<TaskId>> {
        let retried = self.update(op.txn(), |s| {
            let info = s.info(&self.name)?;
            if info.state != TransactionalState::Failed || info.remove_requested {
                return Ok(false);
            }
            info.state = TransactionalState::Down;
            s.state = State::Down;
            Ok(true)
        })?;
        if !retried {
            debug!("Service {} is not failed; retry ignored", self.name);
            return Ok(None);
        }
        info!("Retrying service {}", self.name);
        op.container().emit(
            &self.name,
            EventKind::StateChanged {
                from: State::Failed,
                to: State::Down,
            },
        );
        self.transition(op)
    }

    /// Up-demand the service
    pub(crate) fn up_demand(self: &Arc<Self>, op: &OperationContext) -> Result<()> {
        let first = self.update(op.txn(), |s| {
            s.counters.up_demanded_by += 1;
            Ok(s.counters.up_demanded_by == 1)
        })?;
        if !first {
            return Ok(());
        }
        if self.mode.demand_policy() == Demand::Propagate {
            tasks::demand::schedule(op, self, Vec::new())?;
        }
        self.transition(op).map(drop)
    }

    /// Withdraw an up-demand
    pub(crate) fn up_undemand(self: &Arc<Self>, op: &OperationContext) -> Result<()> {
        let (last, down) = self.update(op.txn(), |s| {
            let up = decrement(&mut s.counters.up_demanded_by, &self.name, "up_demanded_by")?;
            Ok((up == 0, s.counters.down_demanded_by))
        })?;
        if !last {
            return Ok(());
        }
        let demand = self.mode.demand_policy();
        if demand == Demand::Propagate || (down > 0 && demand == Demand::Always) {
            tasks::undemand::schedule(op, self, Vec::new())?;
        }
        self.transition(op).map(drop)
    }

    /// Down-demand the service
    pub(crate) fn down_demand(self: &Arc<Self>, op: &OperationContext) -> Result<()> {
        let (first, up) = self.update(op.txn(), |s| {
            s.counters.down_demanded_by += 1;
            Ok((s.counters.down_demanded_by == 1, s.counters.up_demanded_by))
        })?;
        if !first {
            return Ok(());
        }
        if up == 0 && self.mode.demand_policy() == Demand::Always {
            tasks::undemand::schedule(op, self, Vec::new())?;
        }
        self.transition(op).map(drop)
    }

    /// Withdraw a down-demand
    pub(crate) fn down_undemand(self: &Arc<Self>, op: &OperationContext) -> Result<()> {
        let (last, up) = self.update(op.txn(), |s| {
            let down = decrement(&mut s.counters.down_demanded_by, &self.name, "down_demanded_by")?;
            Ok((down == 0, s.counters.up_demanded_by))
        })?;
        if !last {
            return Ok(());
        }
        if up == 0 && self.mode.demand_policy() == Demand::Always {
            tasks::demand::schedule(op, self, Vec::new())?;
        }
        self.transition(op).map(drop)
    }

    /// A dependent came up
    pub(crate) fn dependent_started(&self, op: &OperationContext) -> Result<()> {
        self.update(op.txn(), |s| {
            s.counters.running_dependents += 1;
            Ok(())
        })
    }

    /// A dependent went down; the last one re-runs the transition
    pub(crate) fn dependent_stopped(self: &Arc<Self>, op: &OperationContext) -> Result<()> {
        let remaining = self.update(op.txn(), |s| {
            decrement(&mut s.counters.running_dependents, &self.name, "running_dependents")
        })?;
        if remaining == 0 {
            self.transition(op)?;
        }
        Ok(())
    }

    /// A dependency came up
    pub(crate) fn dependency_satisfied(self: &Arc<Self>, op: &OperationContext) -> Result<Option<TaskId>> {
        let remaining = self.update(op.txn(), |s| {
            decrement(
                &mut s.counters.unsatisfied_dependencies,
                &self.name,
                "unsatisfied_dependencies",
            )
        })?;
        if remaining == 0 {
            self.transition(op)
        } else {
            Ok(None)
        }
    }

    /// A dependency went down
    pub(crate) fn dependency_unsatisfied(self: &Arc<Self>, op: &OperationContext) -> Result<Option<TaskId>> {
        let unsatisfied = self.update(op.txn(), |s| {
            s.counters.unsatisfied_dependencies += 1;
            Ok(s.counters.unsatisfied_dependencies)
        })?;
        if unsatisfied == 1 {
            self.transition(op)
        } else {
            Ok(None)
        }
    }

    /// Evaluate the lifecycle and schedule whatever it asks for
    ///
    /// Returns the task completing the transition in flight, if any.
    pub(crate) fn transition(self: &Arc<Self>, op: &OperationContext) -> Result<Option<TaskId>> {
        let txn = op.txn();
        let limit = op.container().config().max_transitions_per_transaction;
        let (decision, suppressed, completion) = self.update(txn, |s| {
            let input = s.transition_input(self.mode, &self.name)?;
            let decision = transition::next(&input);
            let info = s.info(&self.name)?;
            let mut suppressed = None;
            match decision {
                Transition::Start { .. } => {
                    info.starts += 1;
                    if info.starts > limit {
                        suppressed = Some(info.starts);
                    } else {
                        info.state = TransactionalState::Starting;
                    }
                }
                Transition::Stop(_) => info.state = TransactionalState::Stopping,
                Transition::Defer => info.perform_transition = true,
                Transition::None => {}
            }
            Ok((decision, suppressed, info.completion))
        })?;

        if let Some(starts) = suppressed {
            if starts == limit + 1 {
                warn!(
                    "Service {} started {} times in transaction {}; suppressing further starts",
                    self.name, limit, txn.id()
                );
                txn.report(Problem::error(format!(
                    "Service {} exceeded {} start transitions in one transaction",
                    self.name, limit
                )));
            }
            return Ok(completion);
        }

        let scheduled = match decision {
            Transition::None => return Ok(completion),
            Transition::Defer => {
                trace!("Service {} deferring transition", self.name);
                return Ok(completion);
            }
            Transition::Start {
                demand_dependencies,
            } => {
                debug!("Service {} starting", self.name);
                let start = tasks::start::schedule(op, self, Vec::new())?;
                if demand_dependencies {
                    tasks::demand::schedule(op, self, vec![start])?;
                }
                start
            }
            Transition::Stop(plan) => {
                debug!("Service {} stopping", self.name);
                self.schedule_stop(op, plan, Vec::new())?
            }
        };
        self.set_completion(txn, scheduled)?;
        Ok(Some(scheduled))
    }

    fn set_completion(&self, txn: &Transaction, task: TaskId) -> Result<()> {
        self.update(txn, |s| {
            s.info(&self.name)?.completion = Some(task);
            Ok(())
        })
    }

    /// Schedule a stop chain: notify, undemand, then stop
    pub(crate) fn schedule_stop(
        self: &Arc<Self>,
        op: &OperationContext,
        plan: StopPlan,
        after: Vec<TaskId>,
    ) -> Result<TaskId> {
        let mut after = after;
        if plan.notify_dependents {
            after = vec![tasks::notify::schedule(op, self, false, after)?];
        }
        if plan.undemand_dependencies {
            after = vec![tasks::undemand::schedule(op, self, after)?];
        }
        tasks::stop::schedule(op, self, plan.from_up, after)
    }

    /// Completion callback of a start or stop chain
    pub(crate) fn set_transition(
        self: &Arc<Self>,
        op: &OperationContext,
        state: TransactionalState,
    ) -> Result<State> {
        let (from, to, rerun) = self.update(op.txn(), |s| {
            let info = s.info(&self.name)?;
            info.completion = None;
            let state = if state == TransactionalState::Down && info.remove_requested {
                TransactionalState::Removing
            } else {
                state
            };
            info.state = state;
            let rerun = std::mem::take(&mut info.perform_transition);
            let from = s.state;
            s.state = state.state();
            Ok((from, s.state, rerun))
        })?;

        if from != to {
            info!("Service {} is {}", self.name, to);
            op.container()
                .emit(&self.name, EventKind::StateChanged { from, to });
        }
        if rerun {
            self.transition(op)?;
        }
        Ok(to)
    }

    /// Request removal
    ///
    /// Controllers wired to this one through a parent edge are removed first
    /// and gate this controller's chain. Returns the task that completes the
    /// removal; repeated requests return the same task.
    pub(crate) fn remove(self: &Arc<Self>, op: &OperationContext) -> Result<TaskId> {
        let txn = op.txn();
        let request = self.update(txn, |s| {
            let input = s.transition_input(self.mode, &self.name)?;
            let info = s.info(&self.name)?;
            if info.remove_requested {
                if let Some(removal) = info.removal {
                    return Ok(RemovalRequest::Scheduled(removal));
                }
            }
            let plan = transition::removal_plan(&input)?;
            info.remove_requested = true;
            match plan {
                RemovalPlan::Immediate => info.state = TransactionalState::Removing,
                RemovalPlan::StopThenRemove(_) => info.state = TransactionalState::Stopping,
                RemovalPlan::AfterStart | RemovalPlan::AfterStop => {}
            }
            Ok(RemovalRequest::New {
                plan,
                completion: info.completion,
            })
        });
        let (plan, completion) = match request {
            Ok(RemovalRequest::Scheduled(removal)) => return Ok(removal),
            Ok(RemovalRequest::New { plan, completion }) => (plan, completion),
            Err(e @ Error::IllegalState { .. }) => {
                txn.report(Problem::critical(format!(
                    "Cannot remove service {}: {}",
                    self.name, e
                )));
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        info!("Removing service {} ({:?})", self.name, plan);

        let mut gates = Vec::new();
        for child in self.children(op) {
            gates.push(child.remove(op)?);
        }

        let removal = match plan {
            RemovalPlan::Immediate => tasks::remove::schedule(op, self, gates)?,
            RemovalPlan::StopThenRemove(stop) => {
                let stop = self.schedule_stop(op, stop, gates)?;
                self.set_completion(txn, stop)?;
                tasks::remove::schedule(op, self, vec![stop])?
            }
            RemovalPlan::AfterStart => {
                gates.extend(completion);
                let stop = tasks::stop::schedule_deferred(op, self, gates)?;
                tasks::remove::schedule(op, self, vec![stop])?
            }
            RemovalPlan::AfterStop => {
                gates.extend(completion);
                tasks::remove::schedule(op, self, gates)?
            }
        };
        self.update(txn, |s| {
            s.info(&self.name)?.removal = Some(removal);
            Ok(())
        })?;
        Ok(removal)
    }

    /// Schedule the stop chain of a removal that waited for its start
    pub(crate) fn stop_after_start(self: &Arc<Self>, op: &OperationContext) -> Result<()> {
        let plan = self.update(op.txn(), |s| {
            let input = s.transition_input(self.mode, &self.name)?;
            let plan = match transition::removal_plan(&input)? {
                RemovalPlan::StopThenRemove(plan) => Some(plan),
                _ => None,
            };
            if plan.is_some() {
                s.info(&self.name)?.state = TransactionalState::Stopping;
            }
            Ok(plan)
        })?;
        if let Some(plan) = plan {
            let stop = self.schedule_stop(op, plan, Vec::new())?;
            self.set_completion(op.txn(), stop)?;
        }
        Ok(())
    }

    /// Controllers bound to this one through a parent edge
    fn children(&self, op: &OperationContext) -> Vec<Arc<ServiceController>> {
        let mut children: Vec<Arc<ServiceController>> = Vec::new();
        for name in self.names() {
            let Some(registration) = op.container().registry().get(name) else {
                continue;
            };
            for edge in registration.incoming() {
                if !edge.has_flag(DependencyFlag::Parent) {
                    continue;
                }
                let child = edge
                    .dependent()
                    .and_then(|id| op.container().controller_by_id(id));
                if let Some(child) = child {
                    if child.id != self.id && children.iter().all(|c| c.id != child.id) {
                        children.push(child);
                    }
                }
            }
        }
        children
    }

    /// Final step of removal: detach from registrations and edges
    pub(crate) fn finish_removal(self: &Arc<Self>, op: &OperationContext) -> Result<()> {
        let txn = op.txn();
        let from = self.update(txn, |s| {
            let info = s.info(&self.name)?;
            info.state = TransactionalState::Removed;
            info.completion = None;
            let from = s.state;
            s.state = State::Removed;
            Ok(from)
        })?;

        for name in self.names() {
            if let Some(registration) = op.container().registry().get(name) {
                registration.clear_controller(txn, self)?;
            }
        }
        for edge in &self.dependencies {
            edge.release(op)?;
        }

        info!("Removed service {}", self.name);
        op.container().emit(
            &self.name,
            EventKind::StateChanged {
                from,
                to: State::Removed,
            },
        );
        op.container().emit(&self.name, EventKind::Removed);
        Ok(())
    }
}

impl fmt::Debug for ServiceController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceController")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_round_trip() {
        let mut state = ControllerState {
            state: State::Down,
            enabled: false,
            counters: ControllerCounters::default(),
            info: None,
        };
        let snapshot = state.take_snapshot();
        state.write_locked();
        assert_eq!(
            state.info.as_ref().map(|info| info.state),
            Some(TransactionalState::Down)
        );

        state.state = State::Up;
        state.enabled = true;
        state.counters.up_demanded_by = 3;
        state.counters.running_dependents = 1;

        state.revert(snapshot);
        state.write_unlocked();
        assert_eq!(state.state, State::Down);
        assert!(!state.enabled);
        assert_eq!(state.counters, ControllerCounters::default());
        assert!(state.info.is_none());
    }

    #[test]
    fn test_decrement_underflow() {
        let name = ServiceName::parse("db");
        let mut value = 1;
        assert_eq!(decrement(&mut value, &name, "up").unwrap(), 0);
        assert!(matches!(
            decrement(&mut value, &name, "up"),
            Err(Error::CounterUnderflow { counter: "up", .. })
        ));
        assert_eq!(value, 0);
    }

    #[test]
    fn test_transition_input_requires_lock() {
        let state = ControllerState {
            state: State::Up,
            enabled: true,
            counters: ControllerCounters::default(),
            info: None,
        };
        let name = ServiceName::parse("db");
        assert!(matches!(
            state.transition_input(ServiceMode::Active, &name),
            Err(Error::MissingTransactionalInfo(_))
        ));
    }
}
