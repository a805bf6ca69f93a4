use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, error, trace, warn};

use crate::{
    config::SignalConfig,
    error::SignalError,
    handle::{Held, RegistryRef},
    host::{ScriptHost, ThreadId},
    listener::{ListenerId, ListenerRegistry},
    scheduler::Scheduler,
    waiter::{Waiter, WaiterQueue},
};

/// What the caller of [`Signal::wait`] must do next.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    /// The waiter is queued; yield to the scheduler until the next fire.
    Blocked,
    /// The signal is closed; yield with no results. Nothing will resume the caller.
    Abandoned,
}

struct State {
    closed: bool,
    listeners: ListenerRegistry,
    waiters: WaiterQueue,
}

/// A broadcast event delivered into a script host.
///
/// Listeners run synchronously inside [`Signal::fire`], on the host's main context. Waiters are
/// never resumed inside `fire`: they are handed to the scheduler for the next frame.
///
/// All methods take `&self` and are safe to call from inside a listener while a fire is in
/// progress. A signal is driven from a single cooperative thread and is not `Sync`.
pub struct Signal<H: ScriptHost> {
    host: Rc<H>,
    scheduler: Option<Rc<dyn Scheduler>>,
    main: Option<ThreadId>,
    state: RefCell<State>,
    // reusable snapshot buffer, lent to one dispatch pass at a time
    scratch: RefCell<Vec<usize>>,
}

impl<H: ScriptHost> std::fmt::Debug for Signal<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Signal")
            .field("closed", &state.closed)
            .field("listeners", &state.listeners.active_len())
            .field("waiters", &state.waiters.len())
            .finish()
    }
}

impl<H: ScriptHost> Signal<H> {
    pub fn new(host: Rc<H>, scheduler: Option<Rc<dyn Scheduler>>) -> Self { Self::with_config(host, scheduler, &SignalConfig::default()) }

    pub fn with_config(host: Rc<H>, scheduler: Option<Rc<dyn Scheduler>>, config: &SignalConfig) -> Self {
        let main = scheduler.as_ref().and_then(|s| s.main_thread());
        Self {
            host,
            scheduler,
            main,
            state: RefCell::new(State { closed: false, listeners: ListenerRegistry::with_capacity(config.reserve), waiters: WaiterQueue::default() }),
            scratch: RefCell::new(Vec::with_capacity(config.reserve)),
        }
    }

    pub fn host(&self) -> &Rc<H> { &self.host }
    pub fn main_thread(&self) -> Option<ThreadId> { self.main }
    pub fn is_closed(&self) -> bool { self.state.borrow().closed }
    pub fn listener_count(&self) -> usize { self.state.borrow().listeners.active_len() }
    pub fn waiter_count(&self) -> usize { self.state.borrow().waiters.len() }

    /// Registers `callable` as a listener.
    ///
    /// The callable is pinned in the main context so it outlives the caller's stack. Sequential
    /// (non-parallel) listeners also get a coroutine reserved for them.
    ///
    /// Returns [`ListenerId::NONE`] when the signal is closed or has no main context. Fails when
    /// the host refuses the value.
    pub fn connect(&self, callable: &H::Value, once: bool, parallel: bool) -> Result<ListenerId, SignalError> {
        if self.is_closed() {
            return Ok(ListenerId::NONE);
        }
        let Some(main) = self.main else {
            return Ok(ListenerId::NONE);
        };

        let func = self.host.pin(main, callable)?;
        let thread = if parallel {
            Held::none()
        } else {
            match self.host.new_thread(main) {
                Ok(r) => Held::new(r),
                Err(e) => {
                    self.host.unpin(main, func);
                    return Err(e.into());
                }
            }
        };

        let id = self.state.borrow_mut().listeners.insert(Held::new(func), thread, once, parallel);
        debug!(listener = %id, once, parallel, "connected");
        Ok(id)
    }

    /// `connect` for a persistent, sequential listener.
    pub fn on(&self, callable: &H::Value) -> Result<ListenerId, SignalError> { self.connect(callable, false, false) }

    /// `connect` for a listener that disconnects after its first invocation.
    pub fn once(&self, callable: &H::Value) -> Result<ListenerId, SignalError> { self.connect(callable, true, false) }

    pub fn is_connected(&self, id: ListenerId) -> bool { self.state.borrow().listeners.is_connected(id) }

    /// Disconnects a listener and gives its references back to the host. Unknown or already
    /// disconnected ids are ignored.
    pub fn disconnect(&self, id: ListenerId) {
        let mut released: Vec<RegistryRef> = Vec::new();
        if !self.state.borrow_mut().listeners.remove(id, |r| released.push(r)) {
            return;
        }
        self.unpin_all(released);
        debug!(listener = %id, "disconnected");
    }

    /// Queues the calling context to be resumed by the next fire.
    ///
    /// On `Ok` the caller must yield: its continuation belongs to the scheduler now. A closed
    /// signal abandons the caller instead of queueing it. A signal without a scheduler cannot
    /// ever resume anyone, which is reported as [`SignalError::NoScheduler`].
    pub fn wait(&self, thread: ThreadId) -> Result<WaitStatus, SignalError> {
        if self.is_closed() {
            return Ok(WaitStatus::Abandoned);
        }
        let Some(scheduler) = &self.scheduler else {
            return Err(SignalError::NoScheduler);
        };

        let waiter = match scheduler.script_of(thread) {
            Some(script) => {
                scheduler.block_script(script);
                Waiter::Script(script)
            }
            None => {
                scheduler.block_task(thread);
                Waiter::Task(thread)
            }
        };
        self.state.borrow_mut().waiters.push(waiter);
        trace!(?waiter, "waiting");
        Ok(WaitStatus::Blocked)
    }

    /// Delivers `args` to every listener, then schedules every waiter for the next frame.
    pub fn fire(&self, args: &[H::Value]) {
        if self.is_closed() {
            return;
        }
        let (Some(scheduler), Some(main)) = (self.scheduler.clone(), self.main) else {
            return;
        };
        trace!(nargs = args.len(), "fire");

        // waits issued by the listeners below are left for the next fire
        let waiters = self.state.borrow_mut().waiters.drain();
        self.call_listeners(main, args);
        if self.is_closed() {
            return;
        }
        self.wake_waiters_next_frame(scheduler.as_ref(), waiters, args);
    }

    fn call_listeners(&self, main: ThreadId, args: &[H::Value]) {
        // listeners connected during this pass wait for the next fire
        let mut pass = std::mem::take(&mut *self.scratch.borrow_mut());
        self.state.borrow().listeners.snapshot_active(&mut pass);

        for &slot in &pass {
            let (id, func, once) = {
                let state = self.state.borrow();
                let Some(listener) = state.listeners.connected_at(slot) else {
                    continue;
                };
                let Some(func) = listener.func.get() else {
                    continue;
                };
                (listener.id, func, listener.once)
            };

            // a once-listener leaves the active set before it runs, so a nested fire cannot reach it
            let detached = if once { self.state.borrow_mut().listeners.detach(id) } else { None };

            if let Err(err) = self.host.call(main, func, args) {
                error!(listener = %id, "listener failed: {err}");
            }

            if let Some((mut func, mut thread)) = detached {
                let mut released = Vec::with_capacity(2);
                func.release(|r| released.push(r));
                thread.release(|r| released.push(r));
                self.unpin_all(released);
                debug!(listener = %id, "once-listener disconnected");
            }
        }

        pass.clear();
        // a nested fire may have returned its own buffer meanwhile; keep the larger one
        let mut scratch = self.scratch.borrow_mut();
        if scratch.capacity() < pass.capacity() {
            *scratch = pass;
        }
    }

    fn wake_waiters_next_frame(&self, scheduler: &dyn Scheduler, waiters: Vec<Waiter>, args: &[H::Value]) {
        for waiter in waiters {
            let thread = match waiter {
                Waiter::Script(script) => scheduler.script_thread(script),
                Waiter::Task(thread) => Some(thread),
            };
            let Some(thread) = thread else {
                continue;
            };
            if !self.host.push_args(thread, args) {
                warn!(%thread, nargs = args.len(), "waiter cannot take resume values, skipped");
                continue;
            }
            match waiter {
                Waiter::Script(script) => scheduler.resume_script_next_frame(script, args.len()),
                Waiter::Task(thread) => scheduler.wake_task_next_frame(thread, args.len()),
            }
        }
    }

    /// Makes the signal permanently inert and gives back every reference it holds. Pending
    /// waiters are abandoned. Calling it again does nothing.
    pub fn close(&self) {
        let released = {
            let mut state = self.state.borrow_mut();
            if state.closed {
                return;
            }
            state.closed = true;
            let mut released = Vec::new();
            state.listeners.clear(|r| released.push(r));
            state.waiters.clear();
            released
        };
        self.scratch.borrow_mut().clear();
        let count = released.len();
        self.unpin_all(released);
        debug!(released = count, "closed");
    }

    fn unpin_all(&self, refs: Vec<RegistryRef>) {
        let Some(main) = self.main else {
            return;
        };
        for r in refs {
            self.host.unpin(main, r);
        }
    }
}

impl<H: ScriptHost> Drop for Signal<H> {
    fn drop(&mut self) { self.close() }
}
