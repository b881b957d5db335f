//! Installation of a built service

use super::{operation, report_failure};
use crate::builder::InstallPlan;
use crate::container::ServiceContainer;
use crate::context::OperationContext;
use crate::controller::ServiceController;
use crate::dependency::Dependency;
use crate::error::{Error, Result};
use async_trait::async_trait;
use service_txn::{Executable, ExecuteContext, TaskController, TaskId};
use std::sync::Arc;
use tracing::debug;

/// Creates the controller, wires it into the registry and installs it
///
/// Completes with the installed controller, or with `None` when the
/// service was installed beneath a parent.
pub(crate) struct ServiceInstallTask {
    container: ServiceContainer,
    plan: Arc<InstallPlan>,
}

#[async_trait]
impl Executable<Option<Arc<ServiceController>>> for ServiceInstallTask {
    async fn execute(&self, ctx: &ExecuteContext<Option<Arc<ServiceController>>>) {
        let op = operation(&self.container, ctx);
        match perform_installation(&op, &self.plan) {
            Ok(controller) => ctx.complete(controller),
            Err(e) => report_failure(ctx, "install", &self.plan.name, e),
        }
    }
}

fn perform_installation(
    op: &OperationContext,
    plan: &InstallPlan,
) -> Result<Option<Arc<ServiceController>>> {
    let Some(parent) = &plan.parent else {
        return install_controller(op, plan, None).map(Some);
    };
    let registration = op.container().registry().get_or_create(parent.name());
    if registration.controller().is_none() {
        return Err(Error::ServiceNotFound(parent.name().clone()));
    }
    debug!("Installing {} beneath parent {}", plan.name, parent.name());
    install_controller(op, plan, Some(parent.create_dependency()))?;
    Ok(None)
}

/// Create and install the controller; a parent edge goes ahead of the rest
fn install_controller(
    op: &OperationContext,
    plan: &InstallPlan,
    parent: Option<Arc<Dependency>>,
) -> Result<Arc<ServiceController>> {
    let container = op.container();
    let registrations: Vec<_> = std::iter::once(&plan.name)
        .chain(plan.aliases.iter())
        .map(|name| container.registry().get_or_create(name))
        .collect();

    let dependencies = parent
        .into_iter()
        .chain(plan.dependencies.iter().map(|spec| spec.create_dependency()))
        .collect();
    let controller = ServiceController::new(
        container.next_controller_id(),
        plan.name.clone(),
        plan.aliases.clone(),
        dependencies,
        plan.mode,
        plan.service.clone(),
    );

    for registration in &registrations {
        registration.set_controller(op.txn(), &controller)?;
    }
    container.track(&controller);
    controller.attach(op)?;
    controller.install(op)?;

    if plan.replacement {
        for registration in &registrations {
            for edge in registration.incoming() {
                edge.replacement_concluded(op)?;
            }
        }
    }
    Ok(controller)
}

pub(crate) fn schedule(
    op: &OperationContext,
    plan: Arc<InstallPlan>,
    after: Vec<TaskId>,
) -> Result<TaskController<Option<Arc<ServiceController>>>> {
    let name = format!("install {}", plan.name);
    let task = op
        .tasks()
        .new_task(ServiceInstallTask {
            container: op.container().clone(),
            plan,
        })
        .named(name)
        .add_dependencies(after)
        .release()?;
    Ok(task)
}
