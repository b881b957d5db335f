//! # Service container
//!
//! Transactional lifecycle coordination for a graph of named services.
//!
//! Services are installed through a [`ServiceTarget`] and a
//! [`ServiceBuilder`], each declaring a [`ServiceMode`] and dependencies on
//! other services by [`ServiceName`]. Every installed service is driven by a
//! [`ServiceController`] through DOWN, STARTING, UP, STOPPING, FAILED and
//! REMOVED, in step with its dependencies, its dependents and the demand
//! placed on it.
//!
//! All changes happen inside a [`service_txn::Transaction`]: operations
//! schedule tasks, [`Transaction::prepare`](service_txn::Transaction::prepare)
//! runs them, and the transaction is then committed or rolled back. Rollback
//! restores every controller, registration and dependency edge it touched.
//!
//! ## Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use service_container::{
//!     LifecycleContext, Service, ServiceContainer, ServiceName, State,
//! };
//! use service_txn::Transaction;
//!
//! struct Database;
//!
//! #[async_trait]
//! impl Service for Database {
//!     async fn start(&self, _ctx: &LifecycleContext) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//!
//!     async fn stop(&self, _ctx: &LifecycleContext) -> anyhow::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! smol::block_on(async {
//!     let container = ServiceContainer::default();
//!     let txn = Transaction::new();
//!     container.target().add_service(&txn, "db", Database).build()?;
//!     txn.prepare().await?;
//!     txn.commit()?;
//!
//!     assert_eq!(container.state_of(&ServiceName::parse("db")), Some(State::Up));
//!     Ok(())
//! })
//! # }
//! ```

pub mod builder;
pub mod config;
mod container;
mod context;
pub mod controller;
pub mod dependency;
pub mod error;
pub mod events;
pub mod mode;
pub mod name;
pub mod registry;
pub mod service;
pub mod state;
mod target;
mod tasks;
pub mod transition;

pub use builder::ServiceBuilder;
pub use config::ContainerConfig;
pub use container::ServiceContainer;
pub use controller::{ControllerCounters, ControllerId, ServiceController};
pub use dependency::{Dependency, DependencyFlag, DependencySpec};
pub use error::{Error, Result};
pub use events::{EventKind, LifecycleEvent};
pub use mode::{Demand, DemandView, ServiceMode};
pub use name::ServiceName;
pub use registry::Registration;
pub use service::{LifecycleContext, Service};
pub use state::{State, TransactionalState};
pub use target::ServiceTarget;
pub use transition::{RemovalPlan, StopPlan, Transition, TransitionInput};
