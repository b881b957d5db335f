//! # Service transactions
//!
//! Transaction and task execution substrate used by the service container.
//!
//! A [`Transaction`] owns a graph of tasks. Tasks are created through a
//! [`TaskBuilder`], may depend on other tasks, and may spawn child tasks while
//! executing. [`Transaction::prepare`] drives the graph until every task is
//! done; [`Transaction::commit`] then releases every write lock taken during
//! the transaction, while [`Transaction::rollback`] restores every locked
//! object to the snapshot captured when it was first locked.
//!
//! ## Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use service_txn::{Executable, ExecuteContext, Transaction};
//!
//! struct Answer;
//!
//! #[async_trait]
//! impl Executable<u32> for Answer {
//!     async fn execute(&self, ctx: &ExecuteContext<u32>) {
//!         ctx.complete(42);
//!     }
//! }
//!
//! # fn main() -> service_txn::Result<()> {
//! smol::block_on(async {
//!     let txn = Transaction::new();
//!     let task = txn.new_task(Answer).release()?;
//!     txn.prepare().await?;
//!     txn.commit()?;
//!     assert_eq!(task.result(), Some(42));
//!     Ok(())
//! })
//! # }
//! ```

pub mod error;
mod graph;
pub mod lock;
pub mod problem;
pub mod task;
pub mod transaction;

pub use error::{Error, Result};
pub use lock::{Transactional, TransactionalObject};
pub use problem::{Problem, Severity};
pub use task::{Executable, ExecuteContext, TaskBuilder, TaskController, TaskFactory, TaskId};
pub use transaction::{Phase, Transaction, TransactionId};
