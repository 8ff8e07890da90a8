//! Event loop implementation.
//!
//! The event loop is the default [`Scheduler`]: promise reactions land in its
//! microtask queue and run when the host drives the loop. Each turn of the
//! loop:
//! 1. Takes the oldest task from the task queue and executes it
//! 2. Drains all microtasks, including ones queued while draining
//! 3. Repeats until both queues are empty

use crate::error::RuntimeError;
use crate::scheduler::{Scheduler, SharedScheduler, DEFAULT_ADOPTION_LIMIT};
use crate::task_queue::{MicroTask, MicrotaskQueue, Task, TaskQueue};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

thread_local! {
    static CURRENT: EventLoop = EventLoop::new();
}

/// Returns a handle to the calling thread's default event loop.
///
/// Promises created without an explicit scheduler queue their reactions here;
/// the host must call [`EventLoop::run_until_done`] on it to make progress.
pub fn current() -> EventLoop {
    CURRENT.with(EventLoop::clone)
}

/// Tuning knobs for an [`EventLoop`].
///
/// # Examples
///
/// ```
/// use promise_runtime::EventLoopConfig;
///
/// let config = EventLoopConfig::default().with_microtask_budget(10_000);
/// assert_eq!(config.microtask_budget, Some(10_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventLoopConfig {
    /// Maximum microtasks run by one drain; `None` drains without bound.
    pub microtask_budget: Option<usize>,
    /// Nested synchronous thenable adoption bound handed to promises.
    ///
    /// A chain of thenables that resolve one another synchronously deeper
    /// than this rejects with a `RangeError`, even when the chain is finite.
    pub adoption_limit: usize,
}

impl EventLoopConfig {
    /// Sets the per-drain microtask budget.
    pub fn with_microtask_budget(mut self, budget: usize) -> Self {
        self.microtask_budget = Some(budget);
        self
    }

    /// Sets the nested thenable adoption bound.
    pub fn with_adoption_limit(mut self, limit: usize) -> Self {
        self.adoption_limit = limit;
        self
    }
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        Self {
            microtask_budget: None,
            adoption_limit: DEFAULT_ADOPTION_LIMIT,
        }
    }
}

struct Queues {
    config: EventLoopConfig,
    tasks: RefCell<TaskQueue>,
    microtasks: RefCell<MicrotaskQueue>,
}

/// A single-threaded event loop.
///
/// `EventLoop` is a cheap handle; clones share the same queues, so a promise
/// holding one can enqueue reactions while the loop is draining.
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoop, Task};
///
/// let event_loop = EventLoop::new();
/// event_loop.enqueue_task(Task::new(|| Ok(())));
/// event_loop.run_until_done().unwrap();
/// assert!(event_loop.is_task_queue_empty());
/// ```
#[derive(Clone)]
pub struct EventLoop {
    inner: Rc<Queues>,
}

impl EventLoop {
    /// Creates a new EventLoop with empty queues and default configuration.
    pub fn new() -> Self {
        Self::with_config(EventLoopConfig::default())
    }

    /// Creates a new EventLoop with the given configuration.
    pub fn with_config(config: EventLoopConfig) -> Self {
        Self {
            inner: Rc::new(Queues {
                config,
                tasks: RefCell::new(TaskQueue::new()),
                microtasks: RefCell::new(MicrotaskQueue::new()),
            }),
        }
    }

    /// Returns the loop's configuration.
    pub fn config(&self) -> &EventLoopConfig {
        &self.inner.config
    }

    /// Returns this loop as a scheduler handle for promise constructors.
    ///
    /// The handle does not keep the loop alive. Once every `EventLoop` clone
    /// is dropped, queued microtasks are freed and later submissions are
    /// discarded.
    pub fn scheduler(&self) -> SharedScheduler {
        Rc::new(LoopHandle {
            queues: Rc::downgrade(&self.inner),
        })
    }

    /// Adds a task to the task queue.
    pub fn enqueue_task(&self, task: Task) {
        self.inner.tasks.borrow_mut().enqueue(task);
    }

    /// Adds a microtask to the microtask queue.
    pub fn enqueue_microtask(&self, microtask: MicroTask) {
        self.inner.microtasks.borrow_mut().enqueue(microtask);
    }

    /// Returns true if the task queue is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.inner.tasks.borrow().is_empty()
    }

    /// Returns true if the microtask queue is empty.
    pub fn is_microtask_queue_empty(&self) -> bool {
        self.inner.microtasks.borrow().is_empty()
    }

    /// Returns the number of queued microtasks.
    pub fn pending_microtasks(&self) -> usize {
        self.inner.microtasks.borrow().len()
    }

    /// Runs the event loop until all tasks and microtasks are processed.
    pub fn run_until_done(&self) -> Result<(), RuntimeError> {
        while !self.is_task_queue_empty() || !self.is_microtask_queue_empty() {
            self.process_one_cycle()?;
        }
        Ok(())
    }

    /// Processes one complete cycle: one task followed by all microtasks.
    pub fn process_one_cycle(&self) -> Result<(), RuntimeError> {
        if let Some(task) = self.next_task() {
            task.run()?;
        }
        self.run_all_microtasks()
    }

    /// Runs microtasks until the queue is empty.
    ///
    /// Microtasks queued during the drain run in the same drain. With a
    /// budget configured, the drain stops once the budget is spent and the
    /// remaining microtasks stay queued.
    pub fn run_all_microtasks(&self) -> Result<(), RuntimeError> {
        let mut ran = 0usize;
        while let Some(microtask) = self.next_microtask() {
            if let Some(budget) = self.inner.config.microtask_budget {
                if ran >= budget {
                    self.requeue_front(microtask);
                    tracing::warn!(budget, "microtask budget exhausted");
                    return Err(RuntimeError::MicrotaskBudgetExceeded { budget });
                }
            }
            microtask.run();
            ran += 1;
        }
        tracing::trace!(ran, "microtask queue drained");
        Ok(())
    }

    // Each pop releases the borrow before the job runs, so jobs may enqueue.
    fn next_task(&self) -> Option<Task> {
        self.inner.tasks.borrow_mut().dequeue()
    }

    fn next_microtask(&self) -> Option<MicroTask> {
        self.inner.microtasks.borrow_mut().dequeue()
    }

    fn requeue_front(&self, microtask: MicroTask) {
        self.inner.microtasks.borrow_mut().requeue(microtask);
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("config", &self.inner.config)
            .field("tasks", &self.inner.tasks.borrow().len())
            .field("microtasks", &self.inner.microtasks.borrow().len())
            .finish()
    }
}

// Promises hold their scheduler, and queued reactions hold promises, so a
// strong handle here would keep an undrained loop alive forever.
struct LoopHandle {
    queues: Weak<Queues>,
}

impl Scheduler for LoopHandle {
    fn submit(&self, task: MicroTask) {
        match self.queues.upgrade() {
            Some(queues) => queues.microtasks.borrow_mut().enqueue(task),
            None => tracing::debug!("event loop dropped, discarding microtask"),
        }
    }

    fn adoption_limit(&self) -> usize {
        self.queues
            .upgrade()
            .map_or(DEFAULT_ADOPTION_LIMIT, |queues| queues.config.adoption_limit)
    }
}
