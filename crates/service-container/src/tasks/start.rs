//! Start chain

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

/// Runs the user start logic and completes the STARTING transition
pub(crate) struct StartServiceTask {
    container: ServiceContainer,
    controller: Arc<ServiceController>,
}

impl StartServiceTask {
    fn complete(&self, op: &OperationContext, outcome: anyhow::Result<()>) -> Result<()> {
        let controller = &self.controller;
        match outcome {
            Ok(()) => {
                for edge in controller.dependencies() {
                    edge.dependent_up(op)?;
                }
                controller.set_transition(op, TransactionalState::Up)?;
                // A removal or stop requested meanwhile supersedes the up edge.
                if controller.is_settled_up(op.txn())? {
                    notify::schedule(op, controller, true, Vec::new())?;
                }
            }
            Err(e) => {
                let reason = format!("{e:#}");
                warn!("Service {} failed to start: {}", controller.name(), reason);
                op.txn().report(Problem::error(format!(
                    "Service {} failed to start: {}",
                    controller.name(),
                    reason
                )));
                op.container()
                    .emit(controller.name(), EventKind::StartFailed { reason });
                controller.set_transition(op, TransactionalState::Failed)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Executable<()> for StartServiceTask {
    async fn execute(&self, ctx: &ExecuteContext<()>) {
        let op = operation(&self.container, ctx);
        let lifecycle = LifecycleContext::new(self.controller.name().clone(), ctx.transaction().id());
        let outcome = self.controller.service().start(&lifecycle).await;
        if let Err(e) = self.complete(&op, outcome) {
            report_failure(ctx, "start", self.controller.name(), e);
        }
    }
}

pub(crate) fn schedule(
    op: &OperationContext,
    controller: &Arc<ServiceController>,
    after: Vec<TaskId>,
) -> Result<TaskId> {
    let task: TaskController<()> = op
        .tasks()
        .new_task(StartServiceTask {
            container: op.container().clone(),
            controller: controller.clone(),
        })
        .named(format!("start {}", controller.name()))
        .add_dependencies(after)
        .release()?;
    Ok(task.id())
}
