//! The deferred-work abstraction promises submit their reactions to.
//!
//! A scheduler runs each submitted [`MicroTask`] strictly after the current
//! synchronous call stack unwinds, in submission order. Promises never call a
//! reaction inline; they always go through `submit`.

use crate::event_loop;
use crate::task_queue::MicroTask;
use std::rc::Rc;

/// Default bound on nested synchronous thenable adoption.
pub const DEFAULT_ADOPTION_LIMIT: usize = 256;

/// Accepts deferred units of work.
///
/// Implementations must preserve submission order and must never run the
/// task before `submit` returns.
pub trait Scheduler {
    /// Queues `task` to run after the current execution context.
    fn submit(&self, task: MicroTask);

    /// Maximum depth of thenables resolving synchronously inside one another
    /// before the adopting promise is rejected.
    fn adoption_limit(&self) -> usize {
        DEFAULT_ADOPTION_LIMIT
    }
}

/// Scheduler handle shared by every promise in a chain.
pub type SharedScheduler = Rc<dyn Scheduler>;

/// Returns the calling thread's default scheduler, its [`EventLoop`].
///
/// [`EventLoop`]: crate::EventLoop
pub fn default_scheduler() -> SharedScheduler {
    event_loop::current().scheduler()
}
