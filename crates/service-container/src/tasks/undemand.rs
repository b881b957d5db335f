//! Withdraw the demand a controller placed on its dependencies

use super::{operation, report_failure};
use crate::container::ServiceContainer;
use crate::context::OperationContext;
use crate::controller::ServiceController;
use crate::error::Result;
use async_trait::async_trait;
use service_txn::{Executable, ExecuteContext, TaskController, TaskId};
use std::sync::Arc;

pub(crate) struct UndemandDependenciesTask {
    container: ServiceContainer,
    controller: Arc<ServiceController>,
}

#[async_trait]
impl Executable<()> for UndemandDependenciesTask {
    async fn execute(&self, ctx: &ExecuteContext<()>) {
        let op = operation(&self.container, ctx);
        for edge in self.controller.dependencies() {
            if let Err(e) = edge.undemand(&op) {
                report_failure(ctx, "undemand dependencies of", self.controller.name(), e);
                return;
            }
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
        .new_task(UndemandDependenciesTask {
            container: op.container().clone(),
            controller: controller.clone(),
        })
        .named(format!("undemand dependencies of {}", controller.name()))
        .add_dependencies(after)
        .release()?;
    Ok(task.id())
}
