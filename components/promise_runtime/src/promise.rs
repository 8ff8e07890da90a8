//! Promise implementation following the Promises/A+ specification.
//!
//! A [`Promise`] owns one settlement slot. It starts pending, settles at most
//! once, and hands its outcome to every reaction registered through
//! [`Promise::then`]. Reactions always run through the promise's
//! [`Scheduler`](crate::Scheduler), never on the caller's stack.

use crate::resolution;
use crate::scheduler::{default_scheduler, SharedScheduler};
use crate::task_queue::MicroTask;
use core_types::{Callback, Thenable, Value};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been fulfilled with a value.
    Fulfilled,
    /// The promise has been rejected with a reason.
    Rejected,
}

impl fmt::Display for PromiseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PromiseState::Pending => "pending",
            PromiseState::Fulfilled => "fulfilled",
            PromiseState::Rejected => "rejected",
        })
    }
}

/// A fulfillment or rejection handler passed to [`Promise::then`].
///
/// Returning `Err(reason)` is the equivalent of throwing: the promise returned
/// by `then` rejects with `reason`.
pub struct Function {
    callback: Box<dyn FnOnce(Value) -> Result<Value, Value>>,
}

impl Function {
    /// Creates a new Function from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(Value) -> Result<Value, Value> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Calls the function with the settled outcome.
    pub fn call(self, arg: Value) -> Result<Value, Value> {
        (self.callback)(arg)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function {{ ... }}")
    }
}

/// Terminal disposition plus the value that goes with it.
#[derive(Debug, Clone)]
pub(crate) enum Outcome {
    Fulfilled(Value),
    Rejected(Value),
}

/// A reaction registered via `then`, fired once when its source settles.
#[derive(Debug)]
pub(crate) struct PromiseReaction {
    promise: Promise,
    on_fulfilled: Option<Function>,
    on_rejected: Option<Function>,
}

impl PromiseReaction {
    fn fire(self, outcome: Outcome) {
        let (handler, arg, rejected) = match outcome {
            Outcome::Fulfilled(value) => (self.on_fulfilled, value, false),
            Outcome::Rejected(reason) => (self.on_rejected, reason, true),
        };

        match handler {
            // pass-through keeps the disposition
            None if rejected => {
                self.promise.reject(arg);
            }
            None => {
                self.promise.fulfill(arg);
            }
            Some(handler) => match handler.call(arg) {
                Ok(value) => {
                    self.promise.fulfill(value);
                }
                Err(reason) => {
                    tracing::debug!(?reason, "promise handler threw");
                    self.promise.reject(reason);
                }
            },
        }
    }
}

enum Slot {
    Pending {
        reactions: Vec<PromiseReaction>,
        // set once the promise is following a thenable
        resolving: bool,
    },
    Fulfilled {
        value: Value,
    },
    Rejected {
        reason: Value,
    },
}

struct PromiseInner {
    slot: RefCell<Slot>,
    scheduler: SharedScheduler,
}

/// Read-only view of a promise returned by [`Promise::inspect`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Current state
    pub state: PromiseState,
    /// Fulfillment value or rejection reason; `Undefined` while pending
    pub value: Value,
}

/// A Promises/A+ promise.
///
/// `Promise` is a handle: clones refer to the same settlement slot. Every
/// promise belongs to a scheduler, and promises returned by `then` share
/// their source's scheduler.
///
/// A rejection that no handler ever observes is kept silently in the
/// promise. Nothing is thrown or reported as an error; attach a rejection
/// handler at the end of a chain if failures must surface.
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoop, Function, Promise, PromiseState};
/// use core_types::Value;
///
/// let event_loop = EventLoop::new();
/// let promise = Promise::new_in(&event_loop.scheduler());
///
/// let doubled = promise.then(
///     Some(Function::new(|v| match v {
///         Value::Smi(n) => Ok(Value::Smi(n * 2)),
///         other => Err(other),
///     })),
///     None,
/// );
///
/// promise.fulfill(Value::Smi(21));
/// assert_eq!(doubled.state(), PromiseState::Pending);
///
/// event_loop.run_until_done().unwrap();
/// assert_eq!(doubled.inspect().value, Value::Smi(42));
/// ```
#[derive(Clone)]
pub struct Promise {
    inner: Rc<PromiseInner>,
}

impl Promise {
    /// Creates a pending promise on the thread's default event loop.
    pub fn new() -> Self {
        Self::new_in(&default_scheduler())
    }

    /// Creates a pending promise on the given scheduler.
    pub fn new_in(scheduler: &SharedScheduler) -> Self {
        Self {
            inner: Rc::new(PromiseInner {
                slot: RefCell::new(Slot::Pending {
                    reactions: Vec::new(),
                    resolving: false,
                }),
                scheduler: Rc::clone(scheduler),
            }),
        }
    }

    /// Creates a promise resolved with `value` on the default event loop.
    ///
    /// A thenable `value` is adopted, so the result may still be pending.
    pub fn resolved(value: Value) -> Self {
        Self::resolved_in(&default_scheduler(), value)
    }

    /// Creates a promise resolved with `value` on the given scheduler.
    pub fn resolved_in(scheduler: &SharedScheduler, value: Value) -> Self {
        let promise = Self::new_in(scheduler);
        promise.fulfill(value);
        promise
    }

    /// Creates a promise rejected with `reason` on the default event loop.
    pub fn rejected(reason: Value) -> Self {
        Self::rejected_in(&default_scheduler(), reason)
    }

    /// Creates a promise rejected with `reason` on the given scheduler.
    pub fn rejected_in(scheduler: &SharedScheduler, reason: Value) -> Self {
        let promise = Self::new_in(scheduler);
        promise.reject(reason);
        promise
    }

    /// The scheduler this promise submits its reactions to.
    pub fn scheduler(&self) -> &SharedScheduler {
        &self.inner.scheduler
    }

    /// Returns true if both handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns the current state.
    pub fn state(&self) -> PromiseState {
        match &*self.inner.slot.borrow() {
            Slot::Pending { .. } => PromiseState::Pending,
            Slot::Fulfilled { .. } => PromiseState::Fulfilled,
            Slot::Rejected { .. } => PromiseState::Rejected,
        }
    }

    /// Returns a snapshot of the state and outcome. Never mutates.
    pub fn inspect(&self) -> Snapshot {
        match &*self.inner.slot.borrow() {
            Slot::Pending { .. } => Snapshot {
                state: PromiseState::Pending,
                value: Value::Undefined,
            },
            Slot::Fulfilled { value } => Snapshot {
                state: PromiseState::Fulfilled,
                value: value.clone(),
            },
            Slot::Rejected { reason } => Snapshot {
                state: PromiseState::Rejected,
                value: reason.clone(),
            },
        }
    }

    /// Registers fulfillment and/or rejection handlers.
    ///
    /// Returns a new promise resolved with the handler's return value, or
    /// rejected with its error. A missing handler passes the outcome through
    /// unchanged. Handlers never run before this call returns, even if the
    /// promise is already settled.
    pub fn then(&self, on_fulfilled: Option<Function>, on_rejected: Option<Function>) -> Promise {
        self.register(on_fulfilled, on_rejected)
    }

    /// Registers a rejection handler; shorthand for `then(None, Some(..))`.
    pub fn catch(&self, on_rejected: Function) -> Promise {
        self.register(None, Some(on_rejected))
    }

    /// Resolves the promise with `value`.
    ///
    /// Ignored if the promise is settled or already following a thenable.
    /// A thenable `value` is adopted rather than stored.
    ///
    /// Thenables that resolve with further thenables synchronously, inside
    /// their own `then`, nest on the stack. Past the scheduler's
    /// [`adoption_limit`](crate::Scheduler::adoption_limit) the promise
    /// rejects with a `RangeError` instead, even when the chain would end.
    /// Thenables that resolve later are not counted.
    pub fn fulfill(&self, value: Value) -> &Self {
        if !self.is_locked() {
            resolution::resolve(self, value);
        }
        self
    }

    /// Rejects the promise with `reason`.
    ///
    /// Ignored if the promise is settled or already following a thenable.
    pub fn reject(&self, reason: Value) -> &Self {
        if !self.is_locked() {
            self.settle(Outcome::Rejected(reason));
        }
        self
    }

    fn register(&self, on_fulfilled: Option<Function>, on_rejected: Option<Function>) -> Promise {
        let reaction = PromiseReaction {
            promise: Promise::new_in(&self.inner.scheduler),
            on_fulfilled,
            on_rejected,
        };
        let downstream = reaction.promise.clone();

        let outcome = {
            let mut slot = self.inner.slot.borrow_mut();
            match &mut *slot {
                Slot::Pending { reactions, .. } => {
                    reactions.push(reaction);
                    return downstream;
                }
                Slot::Fulfilled { value } => Outcome::Fulfilled(value.clone()),
                Slot::Rejected { reason } => Outcome::Rejected(reason.clone()),
            }
        };

        self.dispatch(reaction, outcome);
        downstream
    }

    fn is_locked(&self) -> bool {
        !matches!(
            &*self.inner.slot.borrow(),
            Slot::Pending {
                resolving: false,
                ..
            }
        )
    }

    /// Marks a pending promise as following a thenable; external
    /// `fulfill`/`reject` calls are ignored from then on.
    pub(crate) fn mark_resolving(&self) {
        if let Slot::Pending { resolving, .. } = &mut *self.inner.slot.borrow_mut() {
            *resolving = true;
        }
    }

    /// The single terminal transition. Only the first call has any effect.
    pub(crate) fn settle(&self, outcome: Outcome) {
        let reactions = {
            let mut slot = self.inner.slot.borrow_mut();
            if !matches!(&*slot, Slot::Pending { .. }) {
                return;
            }
            let terminal = match &outcome {
                Outcome::Fulfilled(value) => Slot::Fulfilled {
                    value: value.clone(),
                },
                Outcome::Rejected(reason) => Slot::Rejected {
                    reason: reason.clone(),
                },
            };
            match std::mem::replace(&mut *slot, terminal) {
                Slot::Pending { reactions, .. } => reactions,
                _ => Vec::new(),
            }
        };

        tracing::trace!(state = %self.state(), reactions = reactions.len(), "promise settled");
        if reactions.is_empty() {
            if let Outcome::Rejected(reason) = &outcome {
                tracing::debug!(?reason, "promise rejected with no handler attached");
            }
        }
        for reaction in reactions {
            self.dispatch(reaction, outcome.clone());
        }
    }

    fn dispatch(&self, reaction: PromiseReaction, outcome: Outcome) {
        self.inner
            .scheduler
            .submit(MicroTask::new(move || reaction.fire(outcome)));
    }
}

impl Default for Promise {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.inspect();
        f.debug_struct("Promise")
            .field("state", &snapshot.state)
            .field("value", &snapshot.value)
            .finish()
    }
}

impl Thenable for Promise {
    fn then(&self, on_fulfilled: Callback, on_rejected: Callback) -> Result<(), Value> {
        self.register(
            Some(Function::new(move |value| {
                on_fulfilled.call(value);
                Ok(Value::Undefined)
            })),
            Some(Function::new(move |reason| {
                on_rejected.call(reason);
                Ok(Value::Undefined)
            })),
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl From<Promise> for Value {
    fn from(promise: Promise) -> Self {
        Value::Thenable(Rc::new(promise))
    }
}
