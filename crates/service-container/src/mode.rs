//! Service modes and demand propagation policies

use serde::{Deserialize, Serialize};

/// How a controller propagates demand to its own dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Demand {
    /// Never demand dependencies
    Never,
    /// Demand dependencies from installation on, unless down-demanded
    Always,
    /// Forward demand received from dependents
    Propagate,
    /// Demand dependencies only while the service is starting or up
    ServiceUp,
}

/// Demand counters a mode decides on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemandView {
    /// Up-demand reference count
    pub up: usize,
    /// Down-demand reference count
    pub down: usize,
}

impl DemandView {
    /// Whether anyone asks the service to run
    pub fn is_up_demanded(&self) -> bool {
        self.up > 0
    }

    /// Whether the service is asked to stop; up-demand takes precedence
    pub fn is_down_demanded(&self) -> bool {
        self.down > 0 && self.up == 0
    }
}

/// Policy deciding when a service starts and stops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceMode {
    /// Start as soon as possible; stop only when down-demanded
    #[default]
    Active,
    /// Start once demanded; stay up until down-demanded
    Lazy,
    /// Run exactly while demanded
    OnDemand,
    /// Never start
    Never,
}

impl ServiceMode {
    /// Demand propagation policy of this mode
    pub fn demand_policy(self) -> Demand {
        match self {
            ServiceMode::Active => Demand::Always,
            ServiceMode::Lazy => Demand::ServiceUp,
            ServiceMode::OnDemand => Demand::Propagate,
            ServiceMode::Never => Demand::Never,
        }
    }

    /// Whether a down service should start
    pub fn should_start(self, demand: &DemandView) -> bool {
        match self {
            ServiceMode::Active => !demand.is_down_demanded(),
            ServiceMode::Lazy | ServiceMode::OnDemand => demand.is_up_demanded(),
            ServiceMode::Never => false,
        }
    }

    /// Whether an up service should stop
    pub fn should_stop(self, demand: &DemandView) -> bool {
        match self {
            ServiceMode::Active | ServiceMode::Lazy => demand.is_down_demanded(),
            ServiceMode::OnDemand => !demand.is_up_demanded(),
            ServiceMode::Never => true,
        }
    }
}
