//! An in-process [`ScriptHost`] whose functions are Rust closures.
//!
//! Engine code that wants to listen to signals without an embedded VM, and the test suites,
//! run against this host. Threads are mailboxes: resume values pushed by a fire accumulate
//! there until whoever drives the scheduler takes them.

mod value;

pub use value::*;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tracing::trace;

use crate::{
    error::{CallError, HostError},
    handle::{HandleTable, RegistryRef, Release},
    host::{ScriptHost, ThreadId},
};

enum Pinned {
    Function(NativeFunction),
    Thread(ThreadId),
}

#[derive(Default)]
struct Mailbox {
    args: Vec<ScriptValue>,
    capacity: Option<usize>,
}

pub struct NativeHost {
    main: ThreadId,
    registry: RefCell<HandleTable<Pinned>>,
    threads: RefCell<HashMap<ThreadId, Mailbox>>,
    next_thread: Cell<u64>,
}

impl Default for NativeHost {
    fn default() -> Self { Self::new() }
}

impl NativeHost {
    pub fn new() -> Self {
        let main = ThreadId(0);
        let mut threads = HashMap::new();
        threads.insert(main, Mailbox::default());
        Self { main, registry: RefCell::new(HandleTable::new()), threads: RefCell::new(threads), next_thread: Cell::new(1) }
    }

    pub fn main_thread(&self) -> ThreadId { self.main }

    pub fn spawn_thread(&self) -> ThreadId { self.spawn(None) }

    /// A thread that refuses resume values beyond `capacity` pending ones.
    pub fn spawn_thread_with_capacity(&self, capacity: usize) -> ThreadId { self.spawn(Some(capacity)) }

    fn spawn(&self, capacity: Option<usize>) -> ThreadId {
        let thread = ThreadId(self.next_thread.get());
        self.next_thread.set(thread.0 + 1);
        self.threads.borrow_mut().insert(thread, Mailbox { args: Vec::new(), capacity });
        thread
    }

    pub fn kill_thread(&self, thread: ThreadId) { self.threads.borrow_mut().remove(&thread); }

    pub fn is_alive(&self, thread: ThreadId) -> bool { self.threads.borrow().contains_key(&thread) }

    /// Takes every resume value pushed onto `thread` so far.
    pub fn take_args(&self, thread: ThreadId) -> Vec<ScriptValue> {
        self.threads.borrow_mut().get_mut(&thread).map(|m| std::mem::take(&mut m.args)).unwrap_or_default()
    }

    pub fn pending_args(&self, thread: ThreadId) -> usize { self.threads.borrow().get(&thread).map_or(0, |m| m.args.len()) }

    /// Live registry references, functions and threads alike.
    pub fn pinned_count(&self) -> usize { self.registry.borrow().len() }
}

impl ScriptHost for NativeHost {
    type Value = ScriptValue;

    fn pin(&self, main: ThreadId, callable: &ScriptValue) -> Result<RegistryRef, HostError> {
        if !self.is_alive(main) {
            return Err(HostError::UnknownThread(main));
        }
        match callable {
            ScriptValue::Function(f) => Ok(self.registry.borrow_mut().acquire(Pinned::Function(f.clone()))),
            other => Err(HostError::NotCallable(other.type_name())),
        }
    }

    fn new_thread(&self, main: ThreadId) -> Result<RegistryRef, HostError> {
        if !self.is_alive(main) {
            return Err(HostError::UnknownThread(main));
        }
        let thread = self.spawn_thread();
        Ok(self.registry.borrow_mut().acquire(Pinned::Thread(thread)))
    }

    fn unpin(&self, _main: ThreadId, r: RegistryRef) {
        let released = self.registry.borrow_mut().release(r);
        // dropped here, outside the registry borrow: a closure may own things that unpin on drop
        if let Release::Freed(Pinned::Thread(thread)) = released {
            self.kill_thread(thread);
        }
    }

    fn call(&self, _main: ThreadId, func: RegistryRef, args: &[ScriptValue]) -> Result<(), CallError> {
        let f = match self.registry.borrow().get(func) {
            Some(Pinned::Function(f)) => f.clone(),
            _ => return Err(CallError::new("attempt to call a nil value")),
        };
        f.call(args).map_err(CallError::new)
    }

    fn push_args(&self, thread: ThreadId, args: &[ScriptValue]) -> bool {
        let mut threads = self.threads.borrow_mut();
        let Some(mailbox) = threads.get_mut(&thread) else {
            return false;
        };
        if mailbox.capacity.is_some_and(|cap| mailbox.args.len() + args.len() > cap) {
            return false;
        }
        mailbox.args.extend_from_slice(args);
        trace!(%thread, nargs = args.len(), "pushed resume values");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_requires_function() {
        let host = NativeHost::new();
        let main = host.main_thread();
        assert_eq!(host.pin(main, &ScriptValue::from(1.0)), Err(HostError::NotCallable("number")));
        assert_eq!(host.pin(main, &ScriptValue::Nil), Err(HostError::NotCallable("nil")));
        assert_eq!(host.pinned_count(), 0);
    }

    #[test]
    fn test_call_and_unpin() {
        let host = NativeHost::new();
        let main = host.main_thread();
        let f = host.pin(main, &ScriptValue::function(NativeFunction::fallible(|args| Err(format!("boom {}", args.len()))))).unwrap();
        assert_eq!(host.call(main, f, &[ScriptValue::Nil]), Err(CallError::new("boom 1")));

        host.unpin(main, f);
        assert_eq!(host.pinned_count(), 0);
        assert_eq!(host.call(main, f, &[]), Err(CallError::new("attempt to call a nil value")));
    }

    #[test]
    fn test_reserved_thread_dies_with_its_reference() {
        let host = NativeHost::new();
        let main = host.main_thread();
        let r = host.new_thread(main).unwrap();
        assert_eq!(host.pinned_count(), 1);
        host.unpin(main, r);
        assert_eq!(host.pinned_count(), 0);
        assert!(!host.is_alive(ThreadId(1)));
    }

    #[test]
    fn test_push_args_respects_capacity() {
        let host = NativeHost::new();
        let small = host.spawn_thread_with_capacity(1);
        assert!(host.push_args(small, &[ScriptValue::from(true)]));
        assert!(!host.push_args(small, &[ScriptValue::from(false)]));
        assert_eq!(host.take_args(small), vec![ScriptValue::Bool(true)]);
        assert!(!host.push_args(ThreadId(404), &[]));
    }
}
