//! Stop chain

use super::{notify, operation, report_failure};
use crate::container::ServiceContainer;
use crate::context::OperationContext;
use crate::controller::ServiceController;
use crate::error::Result;
use crate::events::EventKind;
use crate::service::LifecycleContext;
use crate::state::TransactionalState;
use async_trait::async_trait;
use service_txn::{Executable, ExecuteContext, Problem, TaskController, TaskId};
use std::sync::Arc;
use tracing::warn;

/// Runs the user stop logic and completes the STOPPING transition
///
/// A failed service never ran, so its stop only moves it back down.
pub(crate) struct StopServiceTask {
    container: ServiceContainer,
    controller: Arc<ServiceController>,
    from_up: bool,
}

impl StopServiceTask {
    fn complete(&self, op: &OperationContext) -> Result<()> {
        let controller = &self.controller;
        if self.from_up {
            for edge in controller.dependencies() {
                edge.dependent_down(op)?;
            }
            notify::schedule(op, controller, false, Vec::new())?;
        }
        controller.set_transition(op, TransactionalState::Down)?;
        Ok(())
    }
}

#[async_trait]
impl Executable<()> for StopServiceTask {
    async fn execute(&self, ctx: &ExecuteContext<()>) {
        let op = operation(&self.container, ctx);
        if self.from_up {
            let lifecycle =
                LifecycleContext::new(self.controller.name().clone(), ctx.transaction().id());
            if let Err(e) = self.controller.service().stop(&lifecycle).await {
                let reason = format!("{e:#}");
                warn!("Service {} failed to stop cleanly: {}", self.controller.name(), reason);
                ctx.report(Problem::warning(format!(
                    "Service {} failed to stop cleanly: {}",
                    self.controller.name(),
                    reason
                )));
                self.container
                    .emit(self.controller.name(), EventKind::StopFailed { reason });
            }
        }
        if let Err(e) = self.complete(&op) {
            report_failure(ctx, "stop", self.controller.name(), e);
        }
    }
}

/// Stop chain of a removal requested while the service was starting
///
/// Runs once the start completed and schedules the stop matching the state
/// the start ended in.
pub(crate) struct DeferredStopTask {
    container: ServiceContainer,
    controller: Arc<ServiceController>,
}

#[async_trait]
impl Executable<()> for DeferredStopTask {
    async fn execute(&self, ctx: &ExecuteContext<()>) {
        let op = operation(&self.container, ctx);
        if let Err(e) = self.controller.stop_after_start(&op) {
            report_failure(ctx, "stop", self.controller.name(), e);
        }
    }
}

pub(crate) fn schedule(
    op: &OperationContext,
    controller: &Arc<ServiceController>,
    from_up: bool,
    after: Vec<TaskId>,
) -> Result<TaskId> {
    let task: TaskController<()> = op
        .tasks()
        .new_task(StopServiceTask {
            container: op.container().clone(),
            controller: controller.clone(),
            from_up,
        })
        .named(format!("stop {}", controller.name()))
        .add_dependencies(after)
        .release()?;
    Ok(task.id())
}

pub(crate) fn schedule_deferred(
    op: &OperationContext,
    controller: &Arc<ServiceController>,
    after: Vec<TaskId>,
) -> Result<TaskId> {
    let task: TaskController<()> = op
        .tasks()
        .new_task(DeferredStopTask {
            container: op.container().clone(),
            controller: controller.clone(),
        })
        .named(format!("stop {} after start", controller.name()))
        .add_dependencies(after)
        .release()?;
    Ok(task.id())
}
