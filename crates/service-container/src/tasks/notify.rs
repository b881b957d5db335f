//! Fan a controller's up or down edge out to every dependent

use super::{operation, report_failure};
use crate::container::ServiceContainer;
use crate::context::OperationContext;
use crate::controller::ServiceController;
use crate::error::Result;
use async_trait::async_trait;
use service_txn::{Executable, ExecuteContext, TaskController, TaskId};
use std::sync::Arc;
use tracing::trace;

pub(crate) struct NewDependencyStateTask {
    container: ServiceContainer,
    controller: Arc<ServiceController>,
    up: bool,
}

impl NewDependencyStateTask {
    /// Walk incoming edges of the primary registration, then the aliases
    ///
    /// Returns the transitions dependents still have in flight.
    fn notify(&self, op: &OperationContext) -> Result<Vec<TaskId>> {
        let mut pending = Vec::new();
        for name in self.controller.names() {
            let Some(registration) = op.container().registry().get(name) else {
                continue;
            };
            for edge in registration.incoming() {
                pending.extend(edge.new_dependency_state(op, self.up)?);
            }
        }
        Ok(pending)
    }
}

/// Completes once every task it depends on is done
struct AwaitTransitions;

#[async_trait]
impl Executable<()> for AwaitTransitions {
    async fn execute(&self, _ctx: &ExecuteContext<()>) {}
}

#[async_trait]
impl Executable<()> for NewDependencyStateTask {
    async fn execute(&self, ctx: &ExecuteContext<()>) {
        let op = operation(&self.container, ctx);
        let pending = match self.notify(&op) {
            Ok(pending) => pending,
            Err(e) => {
                report_failure(ctx, "notify dependents of", self.controller.name(), e);
                return;
            }
        };
        if pending.is_empty() {
            return;
        }
        trace!(
            "Dependents of {} have {} transitions in flight",
            self.controller.name(),
            pending.len()
        );
        let awaited: service_txn::Result<TaskController<()>> = ctx
            .tasks()
            .new_task(AwaitTransitions)
            .named(format!("await dependents of {}", self.controller.name()))
            .add_dependencies(pending)
            .release();
        if let Err(e) = awaited {
            report_failure(ctx, "notify dependents of", self.controller.name(), e.into());
        }
    }
}

pub(crate) fn schedule(
    op: &OperationContext,
    controller: &Arc<ServiceController>,
    up: bool,
    after: Vec<TaskId>,
) -> Result<TaskId> {
    let direction = if up { "up" } else { "down" };
    let task: TaskController<()> = op
        .tasks()
        .new_task(NewDependencyStateTask {
            container: op.container().clone(),
            controller: controller.clone(),
            up,
        })
        .named(format!("notify {} of {}", direction, controller.name()))
        .add_dependencies(after)
        .release()?;
    Ok(task.id())
}
