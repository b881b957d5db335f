//! Final step of the removal protocol

use super::{operation, report_failure};
use crate::container::ServiceContainer;
use crate::context::OperationContext;
use crate::controller::ServiceController;
use crate::error::Result;
use async_trait::async_trait;
use service_txn::{Executable, ExecuteContext, TaskController, TaskId};
use std::sync::Arc;

pub(crate) struct ServiceRemoveTask {
    container: ServiceContainer,
    controller: Arc<ServiceController>,
}

#[async_trait]
impl Executable<()> for ServiceRemoveTask {
    async fn execute(&self, ctx: &ExecuteContext<()>) {
        let op = operation(&self.container, ctx);
        if let Err(e) = self.controller.finish_removal(&op) {
            report_failure(ctx, "remove", self.controller.name(), e);
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
        .new_task(ServiceRemoveTask {
            container: op.container().clone(),
            controller: controller.clone(),
        })
        .named(format!("remove {}", controller.name()))
        .add_dependencies(after)
        .release()?;
    Ok(task.id())
}
