//! Error types for the service container

use crate::name::ServiceName;
use crate::state::TransactionalState;
use thiserror::Error;

/// Service container error type
#[derive(Error, Debug)]
pub enum Error {
    /// Transaction substrate error
    #[error("Transaction error: {0}")]
    Transaction(#[from] service_txn::Error),

    /// No controller is installed under the name
    #[error("Service not found: {0}")]
    ServiceNotFound(ServiceName),

    /// Another controller already occupies the registration
    #[error("Service already installed: {0}")]
    DuplicateService(ServiceName),

    /// `build` was already called on this builder
    #[error("Service builder for {0} was already built")]
    BuilderAlreadyInstalled(ServiceName),

    /// More than one dependency flagged as parent
    #[error("{owner} already has a parent dependency; cannot add parent {parent}")]
    MultipleParents {
        /// Builder or target the dependency was added to
        owner: String,
        /// Rejected parent
        parent: ServiceName,
    },

    /// Operation requested from a state the lifecycle never reaches it in
    #[error("Illegal controller state {state:?} for {operation}")]
    IllegalState {
        /// Internal state at the time of the request
        state: TransactionalState,
        /// Attempted operation
        operation: &'static str,
    },

    /// A reference counter would drop below zero
    #[error("Counter {counter} of service {service} would drop below zero")]
    CounterUnderflow {
        /// Service
        service: ServiceName,
        /// Counter name
        counter: &'static str,
    },

    /// Transactional bookkeeping read while the controller is not locked
    #[error("Service {0} is not write locked by the transaction")]
    MissingTransactionalInfo(ServiceName),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
