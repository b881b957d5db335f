//! Controller lifecycle states
//!
//! [`State`] is what the world outside a transaction observes.
//! [`TransactionalState`] is the finer-grained state a controller moves
//! through while write locked; each maps to exactly one [`State`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Published controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    /// Running; satisfied dependencies may not change state without stopping it
    Up,
    /// Stopped; every up dependent is down
    Down,
    /// Start failed or was cancelled
    Failed,
    /// Removed from the container
    Removed,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Up => "UP",
            State::Down => "DOWN",
            State::Failed => "FAILED",
            State::Removed => "REMOVED",
        };
        f.write_str(name)
    }
}

/// Internal controller state while write locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionalState {
    /// See [`State::Up`]
    Up,
    /// See [`State::Down`]
    Down,
    /// See [`State::Failed`]
    Failed,
    /// See [`State::Removed`]
    Removed,
    /// Start logic in flight; may not be left until it finishes or fails
    Starting,
    /// Stop logic in flight; up dependents are already down or stopping
    Stopping,
    /// Down and being removed
    Removing,
}

impl TransactionalState {
    /// Published projection of this state
    pub fn state(self) -> State {
        match self {
            TransactionalState::Up | TransactionalState::Stopping => State::Up,
            TransactionalState::Down
            | TransactionalState::Starting
            | TransactionalState::Removing => State::Down,
            TransactionalState::Failed => State::Failed,
            TransactionalState::Removed => State::Removed,
        }
    }

    /// Whether a start or stop chain is in flight
    pub fn is_transitioning(self) -> bool {
        matches!(
            self,
            TransactionalState::Starting | TransactionalState::Stopping
        )
    }
}

impl From<State> for TransactionalState {
    fn from(state: State) -> Self {
        match state {
            State::Up => TransactionalState::Up,
            State::Down => TransactionalState::Down,
            State::Failed => TransactionalState::Failed,
            State::Removed => TransactionalState::Removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_states_project_to_published() {
        use TransactionalState::*;

        assert_eq!(Starting.state(), State::Down);
        assert_eq!(Stopping.state(), State::Up);
        assert_eq!(Removing.state(), State::Down);
        for state in [State::Up, State::Down, State::Failed, State::Removed] {
            assert_eq!(TransactionalState::from(state).state(), state);
        }
    }
}
