//! User service contract

use crate::name::ServiceName;
use async_trait::async_trait;
use service_txn::TransactionId;

/// Context handed to user start and stop logic
#[derive(Debug, Clone)]
pub struct LifecycleContext {
    name: ServiceName,
    transaction: TransactionId,
}

impl LifecycleContext {
    pub(crate) fn new(name: ServiceName, transaction: TransactionId) -> Self {
        Self { name, transaction }
    }

    /// Name of the service being started or stopped
    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Transaction driving the lifecycle change
    pub fn transaction(&self) -> TransactionId {
        self.transaction
    }
}

/// A startable and stoppable unit managed by a controller
///
/// Any error returned from [`Service::start`] puts the service in the
/// FAILED state. Errors returned from [`Service::stop`] are recorded but the
/// service still goes down.
///
/// Both methods run during [`Transaction::prepare`](service_txn::Transaction::prepare),
/// before the transaction is committed. Rolling the transaction back restores
/// the container's view of the service but does not call the opposite method,
/// so anything `start` or `stop` did outside the container stays done.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Start the service
    async fn start(&self, ctx: &LifecycleContext) -> anyhow::Result<()>;

    /// Stop the service
    async fn stop(&self, ctx: &LifecycleContext) -> anyhow::Result<()>;
}
