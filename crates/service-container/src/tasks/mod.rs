//! Executables scheduled by controllers and builders
//!
//! Each task holds the container and the controller it acts on. Errors
//! cannot escape an executable, so they are reported on the transaction as
//! critical problems.

pub(crate) mod demand;
pub(crate) mod install;
pub(crate) mod notify;
pub(crate) mod remove;
pub(crate) mod start;
pub(crate) mod stop;
pub(crate) mod undemand;

use crate::container::ServiceContainer;
use crate::context::OperationContext;
use crate::error::Error;
use crate::name::ServiceName;
use service_txn::{ExecuteContext, Problem};
use tracing::error;

/// Operation context whose scheduled work becomes children of the running task
fn operation<T: Send + 'static>(
    container: &ServiceContainer,
    ctx: &ExecuteContext<T>,
) -> OperationContext {
    OperationContext::new(container.clone(), ctx.tasks().clone())
}

fn report_failure<T: Send + 'static>(
    ctx: &ExecuteContext<T>,
    action: &str,
    service: &ServiceName,
    failure: Error,
) {
    error!("Failed to {} service {}: {}", action, service, failure);
    ctx.report(Problem::critical(format!(
        "Failed to {action} service {service}: {failure}"
    )));
}
