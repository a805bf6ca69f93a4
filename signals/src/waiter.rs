use crate::host::{ScriptId, ThreadId};

/// A coroutine blocked until the next fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waiter {
    /// Owned by a script; resolved to the script's live thread when woken.
    Script(ScriptId),
    /// A free-standing task, resumed directly.
    Task(ThreadId),
}

/// Waiters for the next fire, in arrival order.
#[derive(Debug, Default)]
pub struct WaiterQueue(Vec<Waiter>);

impl WaiterQueue {
    pub fn push(&mut self, waiter: Waiter) { self.0.push(waiter) }

    /// Takes every queued waiter, leaving the queue empty for waits issued afterwards.
    pub fn drain(&mut self) -> Vec<Waiter> { std::mem::take(&mut self.0) }

    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn clear(&mut self) { self.0.clear() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_empties_queue() {
        let mut queue = WaiterQueue::default();
        queue.push(Waiter::Script(ScriptId(1)));
        queue.push(Waiter::Task(ThreadId(2)));

        let drained = queue.drain();
        assert_eq!(drained, vec![Waiter::Script(ScriptId(1)), Waiter::Task(ThreadId(2))]);
        assert!(queue.is_empty());

        queue.push(Waiter::Task(ThreadId(3)));
        assert_eq!(queue.len(), 1);
    }
}
