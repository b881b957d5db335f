//! Pure lifecycle decisions
//!
//! Nothing in here touches a transaction. The controller feeds a snapshot of
//! its counters and flags in and executes the returned intent.

use crate::error::{Error, Result};
use crate::mode::Demand;
use crate::state::TransactionalState;

/// Everything the transition function looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionInput {
    /// Current internal state
    pub state: TransactionalState,
    /// Unsatisfied dependency count
    pub unsatisfied: usize,
    /// Running dependent count
    pub running_dependents: usize,
    /// Administrative switch
    pub enabled: bool,
    /// Mode verdict for a down service
    pub should_start: bool,
    /// Mode verdict for an up service
    pub should_stop: bool,
    /// Demand propagation policy of the mode
    pub demand: Demand,
    /// Removal has been requested
    pub remove_requested: bool,
}

impl TransitionInput {
    fn may_start(&self) -> bool {
        self.unsatisfied == 0 && self.should_start && self.enabled
    }

    fn must_stop(&self) -> bool {
        self.unsatisfied > 0 || self.should_stop || !self.enabled
    }
}

/// Shape of a stop chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPlan {
    /// Run the user stop logic (false when stopping a failed service)
    pub from_up: bool,
    /// Tell running dependents the service is going down first
    pub notify_dependents: bool,
    /// Undemand own dependencies first
    pub undemand_dependencies: bool,
}

impl StopPlan {
    fn from_up(input: &TransitionInput) -> Self {
        Self {
            from_up: true,
            notify_dependents: input.running_dependents > 0,
            undemand_dependencies: input.demand == Demand::ServiceUp,
        }
    }

    fn from_failed(input: &TransitionInput) -> Self {
        Self {
            from_up: false,
            notify_dependents: false,
            undemand_dependencies: input.demand == Demand::ServiceUp,
        }
    }
}

/// Work the controller has to schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing to do
    None,
    /// Move to STARTING and schedule the start chain
    Start {
        /// Also demand own dependencies once the start chain completes
        demand_dependencies: bool,
    },
    /// Move to STOPPING and schedule the stop chain
    Stop(StopPlan),
    /// A chain is in flight; re-run the transition once it completes
    Defer,
}

/// Decide the next step of the lifecycle
pub fn next(input: &TransitionInput) -> Transition {
    if input.remove_requested {
        return Transition::None;
    }
    match input.state {
        TransactionalState::Down if input.may_start() => Transition::Start {
            demand_dependencies: input.demand == Demand::ServiceUp,
        },
        TransactionalState::Stopping
            if input.unsatisfied == 0 && !input.should_stop && input.enabled =>
        {
            Transition::Defer
        }
        TransactionalState::Failed if input.must_stop() => {
            Transition::Stop(StopPlan::from_failed(input))
        }
        TransactionalState::Up if input.must_stop() => Transition::Stop(StopPlan::from_up(input)),
        TransactionalState::Starting if !input.may_start() => Transition::Defer,
        _ => Transition::None,
    }
}

/// How a removal request is carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPlan {
    /// Down already; remove right away
    Immediate,
    /// Stop first, then remove
    StopThenRemove(StopPlan),
    /// Wait for the in-flight start, stop, then remove
    AfterStart,
    /// Remove once the in-flight stop completes
    AfterStop,
}

/// Decide how to remove a controller in the given state
pub fn removal_plan(input: &TransitionInput) -> Result<RemovalPlan> {
    match input.state {
        TransactionalState::Down => Ok(RemovalPlan::Immediate),
        TransactionalState::Up => Ok(RemovalPlan::StopThenRemove(StopPlan::from_up(input))),
        TransactionalState::Failed => Ok(RemovalPlan::StopThenRemove(StopPlan::from_failed(input))),
        TransactionalState::Starting => Ok(RemovalPlan::AfterStart),
        TransactionalState::Stopping => Ok(RemovalPlan::AfterStop),
        state @ (TransactionalState::Removing | TransactionalState::Removed) => {
            Err(Error::IllegalState {
                state,
                operation: "remove",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(state: TransactionalState) -> TransitionInput {
        TransitionInput {
            state,
            unsatisfied: 0,
            running_dependents: 0,
            enabled: true,
            should_start: true,
            should_stop: false,
            demand: Demand::Always,
            remove_requested: false,
        }
    }

    #[test]
    fn test_down_starts_when_eligible() {
        let down = input(TransactionalState::Down);
        assert_eq!(
            next(&down),
            Transition::Start {
                demand_dependencies: false
            }
        );

        let lazy = TransitionInput {
            demand: Demand::ServiceUp,
            ..down
        };
        assert_eq!(
            next(&lazy),
            Transition::Start {
                demand_dependencies: true
            }
        );

        for blocked in [
            TransitionInput {
                unsatisfied: 1,
                ..down
            },
            TransitionInput {
                enabled: false,
                ..down
            },
            TransitionInput {
                should_start: false,
                ..down
            },
        ] {
            assert_eq!(next(&blocked), Transition::None);
        }
    }

    #[test]
    fn test_up_stops_and_notifies_running_dependents() {
        let up = TransitionInput {
            enabled: false,
            running_dependents: 2,
            ..input(TransactionalState::Up)
        };
        assert_eq!(
            next(&up),
            Transition::Stop(StopPlan {
                from_up: true,
                notify_dependents: true,
                undemand_dependencies: false
            })
        );

        let satisfied = input(TransactionalState::Up);
        assert_eq!(next(&satisfied), Transition::None);
    }

    #[test]
    fn test_failed_stops_without_user_logic() {
        let failed = TransitionInput {
            unsatisfied: 1,
            ..input(TransactionalState::Failed)
        };
        assert!(matches!(
            next(&failed),
            Transition::Stop(StopPlan { from_up: false, .. })
        ));
        assert_eq!(next(&input(TransactionalState::Failed)), Transition::None);
    }

    #[test]
    fn test_in_flight_chains_defer() {
        let starting = TransitionInput {
            enabled: false,
            ..input(TransactionalState::Starting)
        };
        assert_eq!(next(&starting), Transition::Defer);
        assert_eq!(next(&input(TransactionalState::Starting)), Transition::None);

        let stopping = input(TransactionalState::Stopping);
        assert_eq!(next(&stopping), Transition::Defer);
        let still_stopping = TransitionInput {
            should_stop: true,
            ..stopping
        };
        assert_eq!(next(&still_stopping), Transition::None);
    }

    #[test]
    fn test_removal_request_suppresses_transitions() {
        for state in [
            TransactionalState::Down,
            TransactionalState::Up,
            TransactionalState::Failed,
            TransactionalState::Starting,
        ] {
            let requested = TransitionInput {
                remove_requested: true,
                enabled: false,
                ..input(state)
            };
            assert_eq!(next(&requested), Transition::None, "{state:?}");
        }
    }

    #[test]
    fn test_removal_plans() {
        assert_eq!(
            removal_plan(&input(TransactionalState::Down)).unwrap(),
            RemovalPlan::Immediate
        );
        assert_eq!(
            removal_plan(&input(TransactionalState::Starting)).unwrap(),
            RemovalPlan::AfterStart
        );
        assert_eq!(
            removal_plan(&input(TransactionalState::Stopping)).unwrap(),
            RemovalPlan::AfterStop
        );
        assert!(matches!(
            removal_plan(&input(TransactionalState::Up)).unwrap(),
            RemovalPlan::StopThenRemove(StopPlan { from_up: true, .. })
        ));
        assert!(matches!(
            removal_plan(&input(TransactionalState::Removing)),
            Err(Error::IllegalState { .. })
        ));
    }
}
