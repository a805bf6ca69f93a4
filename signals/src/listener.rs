use std::collections::HashMap;

use crate::handle::{Held, RegistryRef};

/// Stable identity of a listener. Ids are handed out in increasing order and never reused.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Returned by `connect` when nothing was connected.
    pub const NONE: ListenerId = ListenerId(0);

    pub fn is_none(&self) -> bool { self.0 == 0 }
    pub fn get(&self) -> u64 { self.0 }
}

impl From<ListenerId> for u64 {
    fn from(id: ListenerId) -> u64 { id.0 }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// One persistent subscription.
#[derive(Debug)]
pub struct Listener {
    pub id: ListenerId,
    pub func: Held,
    /// Coroutine reserved for sequential (non-parallel) listeners. Held but not yet used by dispatch.
    pub thread: Held,
    pub once: bool,
    pub parallel: bool,
    pub connected: bool,
    active_pos: Option<usize>,
}

impl Listener {
    pub fn active_pos(&self) -> Option<usize> { self.active_pos }

    /// Empties both held references, passing each to `release` once.
    pub fn release(&mut self, mut release: impl FnMut(RegistryRef)) {
        self.func.release(&mut release);
        self.thread.release(&mut release);
    }
}

/// Dense listener storage with an active index and an id lookup.
///
/// Records are only ever appended; a disconnected record keeps its slot until the registry is
/// cleared, so slot indices captured in a dispatch snapshot stay valid for the whole pass.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    listeners: Vec<Listener>,
    active: Vec<usize>,
    by_id: HashMap<ListenerId, usize>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { listeners: Vec::with_capacity(capacity), active: Vec::with_capacity(capacity), by_id: HashMap::with_capacity(capacity), next_id: 0 }
    }

    /// Appends a connected listener and marks it active.
    pub fn insert(&mut self, func: Held, thread: Held, once: bool, parallel: bool) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        let slot = self.listeners.len();
        self.active.push(slot);
        self.listeners.push(Listener { id, func, thread, once, parallel, connected: true, active_pos: Some(self.active.len() - 1) });
        self.by_id.insert(id, slot);
        id
    }

    pub fn is_connected(&self, id: ListenerId) -> bool {
        self.by_id.get(&id).and_then(|slot| self.listeners.get(*slot)).is_some_and(|l| l.connected)
    }

    /// Marks the listener disconnected, swap-removes it from the active set and forgets its id,
    /// handing back the references it held. `None` when the id was unknown.
    pub fn detach(&mut self, id: ListenerId) -> Option<(Held, Held)> {
        let slot = self.by_id.remove(&id)?;
        let listener = self.listeners.get_mut(slot)?;
        if !listener.connected {
            return Some((Held::none(), Held::none()));
        }
        listener.connected = false;
        let held = (std::mem::take(&mut listener.func), std::mem::take(&mut listener.thread));

        if let Some(pos) = listener.active_pos.take() {
            if pos < self.active.len() {
                self.active.swap_remove(pos);
                if let Some(&moved) = self.active.get(pos) {
                    self.listeners[moved].active_pos = Some(pos);
                }
            }
        }
        Some(held)
    }

    /// `detach`, then hands both references to `release`. Returns false when the id was unknown.
    pub fn remove(&mut self, id: ListenerId, mut release: impl FnMut(RegistryRef)) -> bool {
        match self.detach(id) {
            Some((mut func, mut thread)) => {
                func.release(&mut release);
                thread.release(&mut release);
                true
            }
            None => false,
        }
    }

    /// The listener stored at `slot`, if it is still connected.
    pub fn connected_at(&self, slot: usize) -> Option<&Listener> { self.listeners.get(slot).filter(|l| l.connected) }

    /// Copies the active set into `into`, replacing its contents.
    pub fn snapshot_active(&self, into: &mut Vec<usize>) {
        into.clear();
        into.extend_from_slice(&self.active);
    }

    pub fn active_len(&self) -> usize { self.active.len() }

    /// Releases every reference held by any record, connected or not, and empties the registry.
    /// The id counter keeps counting.
    pub fn clear(&mut self, mut release: impl FnMut(RegistryRef)) {
        for listener in self.listeners.iter_mut() {
            listener.release(&mut release);
            listener.connected = false;
            listener.active_pos = None;
        }
        self.listeners.clear();
        self.active.clear();
        self.by_id.clear();
    }

    pub fn iter_active(&self) -> impl Iterator<Item = &Listener> + '_ { self.active.iter().map(|slot| &self.listeners[*slot]) }
}
