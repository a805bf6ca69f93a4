use crate::{
    error::{CallError, HostError},
    handle::RegistryRef,
};

/// Identity of an execution context (a coroutine) inside the host interpreter.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ThreadId(pub u64);

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "thread:{}", self.0) }
}

/// Identity of a logical script. A script outlives any particular thread it runs on,
/// so waiters owned by a script are resolved to a thread only when they are woken.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScriptId(pub u64);

impl std::fmt::Display for ScriptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "script:{}", self.0) }
}

/// The interpreter a signal delivers into.
///
/// Every `RegistryRef` returned by `pin` or `new_thread` is owned by the caller until it is
/// handed back through `unpin`, exactly once.
pub trait ScriptHost {
    type Value: Clone;

    /// Moves `callable` into the `main` context and takes a counted reference to it.
    fn pin(&self, main: ThreadId, callable: &Self::Value) -> Result<RegistryRef, HostError>;

    /// Creates a fresh suspended coroutine under `main` and takes a counted reference to it.
    fn new_thread(&self, main: ThreadId) -> Result<RegistryRef, HostError>;

    /// Gives back a reference obtained from `pin` or `new_thread`.
    fn unpin(&self, main: ThreadId, r: RegistryRef);

    /// Calls the pinned function with `args` on the `main` context.
    fn call(&self, main: ThreadId, func: RegistryRef, args: &[Self::Value]) -> Result<(), CallError>;

    /// Pushes resume values onto `thread`. False when the thread cannot take them.
    fn push_args(&self, thread: ThreadId, args: &[Self::Value]) -> bool;
}
