//! Demand a controller's dependencies

use super::{operation, report_failure};
use crate::container::ServiceContainer;
use crate::context::OperationContext;
use crate::controller::ServiceController;
use crate::error::Result;
use async_trait::async_trait;
use service_txn::{Executable, ExecuteContext, TaskController, TaskId};
use std::sync::Arc;

pub(crate) struct DemandDependenciesTask {
    container: ServiceContainer,
    controller: Arc<ServiceController>,
}

impl DemandDependenciesTask {
    fn demand(&self, op: &OperationContext) -> Result<()> {
        for edge in self.controller.dependencies() {
            edge.demand(op)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Executable<()> for DemandDependenciesTask {
    async fn execute(&self, ctx: &ExecuteContext<()>) {
        let op = operation(&self.container, ctx);
        if let Err(e) = self.demand(&op) {
            report_failure(ctx, "demand dependencies of", self.controller.name(), e);
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
        .new_task(DemandDependenciesTask {
            container: op.container().clone(),
            controller: controller.clone(),
        })
        .named(format!("demand dependencies of {}", controller.name()))
        .add_dependencies(after)
        .release()?;
    Ok(task.id())
}
