//! Promises/A+ runtime.
//!
//! This crate provides a single-threaded deferred-value primitive and the
//! machinery around it:
//! - [`Promise`] - Promises/A+ state machine with thenable adoption
//! - [`Scheduler`] - where promise reactions are queued
//! - [`EventLoop`] - the default scheduler, with task and microtask queues
//! - [`Promise::all`], [`Promise::promisify`], [`Promise::prepare`] and
//!   [`Promise::deferred`] - combinators built on the public promise API
//!
//! # Overview
//!
//! Reactions registered with [`Promise::then`] never run on the caller's
//! stack. They are submitted to the promise's scheduler and run when the
//! host drives the loop.
//!
//! # Examples
//!
//! ```
//! use promise_runtime::{EventLoop, Function, Promise};
//! use core_types::Value;
//!
//! let event_loop = EventLoop::new();
//! let scheduler = event_loop.scheduler();
//!
//! let read = Promise::prepare_in(scheduler.clone(), |args, callback| {
//!     callback.call(Value::Null, args[0].clone());
//! });
//!
//! let all = Promise::all_in(&scheduler, vec![Value::from(read(vec![Value::from("a")])), Value::from("b")]);
//! let joined = all.then(
//!     Some(Function::new(|v| Ok(Value::Smi(v.as_array().map_or(0, |a| a.len() as i32))))),
//!     None,
//! );
//!
//! event_loop.run_until_done().unwrap();
//! assert_eq!(joined.inspect().value, Value::Smi(2));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod adapters;
mod all;
pub mod error;
pub mod event_loop;
pub mod promise;
mod resolution;
pub mod scheduler;
pub mod task_queue;

// Re-export main types at crate root
pub use adapters::{Deferred, NodeCallback};
pub use error::RuntimeError;
pub use event_loop::{EventLoop, EventLoopConfig};
pub use promise::{Function, Promise, PromiseState, Snapshot};
pub use scheduler::{default_scheduler, Scheduler, SharedScheduler, DEFAULT_ADOPTION_LIMIT};
pub use task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue};
