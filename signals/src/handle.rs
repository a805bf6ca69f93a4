use tracing::warn;

/// A counted reference into a host registry.
///
/// The generation makes a reference to a recycled slot distinguishable from the
/// reference that originally occupied it, so a stale release can be refused.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RegistryRef {
    index: u32,
    generation: u32,
}

impl RegistryRef {
    pub fn index(&self) -> u32 { self.index }
    pub fn generation(&self) -> u32 { self.generation }
}

impl std::fmt::Display for RegistryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "ref#{}.{}", self.index, self.generation) }
}

/// A reference held on behalf of a registration, released at most once.
///
/// `None` plays the role of the "no reference" sentinel: once released the slot is
/// emptied, so a second release has nothing to give back.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Held(Option<RegistryRef>);

impl Held {
    pub fn new(r: RegistryRef) -> Self { Self(Some(r)) }
    pub fn none() -> Self { Self(None) }

    pub fn get(&self) -> Option<RegistryRef> { self.0 }
    pub fn is_held(&self) -> bool { self.0.is_some() }

    /// Hands the reference to `release` and leaves the slot empty.
    pub fn release(&mut self, release: impl FnOnce(RegistryRef)) {
        if let Some(r) = self.0.take() {
            release(r);
        }
    }
}

impl From<RegistryRef> for Held {
    fn from(r: RegistryRef) -> Self { Self::new(r) }
}

/// Outcome of [`HandleTable::release`].
#[derive(Debug, PartialEq, Eq)]
pub enum Release<T> {
    /// The reference was unknown or already released.
    Stale,
    /// Other counts remain.
    Retained(u32),
    /// That was the last count; the value is handed back so the caller controls when it drops.
    Freed(T),
}

impl<T> Release<T> {
    pub fn is_stale(&self) -> bool { matches!(self, Release::Stale) }
}

struct Slot<T> {
    value: Option<T>,
    refs: u32,
    generation: u32,
}

/// Reference-counted storage for values a host keeps alive on behalf of native code.
///
/// Slots are recycled through a free list; every recycle bumps the slot's generation.
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self { Self::new() }
}

impl<T> HandleTable<T> {
    pub fn new() -> Self { Self { slots: Vec::new(), free: Vec::new(), live: 0 } }

    pub fn with_capacity(capacity: usize) -> Self { Self { slots: Vec::with_capacity(capacity), free: Vec::new(), live: 0 } }

    /// Stores `value` with a reference count of one.
    pub fn acquire(&mut self, value: T) -> RegistryRef {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            slot.refs = 1;
            return RegistryRef { index, generation: slot.generation };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { value: Some(value), refs: 1, generation: 0 });
        RegistryRef { index, generation: 0 }
    }

    /// Adds a count to a live reference.
    pub fn retain(&mut self, r: RegistryRef) -> bool {
        match self.slot_mut(r) {
            Some(slot) => {
                slot.refs += 1;
                true
            }
            None => {
                warn!("retain of stale handle {r}");
                false
            }
        }
    }

    /// Drops one count. At zero the value is handed back and the slot recycled.
    pub fn release(&mut self, r: RegistryRef) -> Release<T> {
        let Some(slot) = self.slot_mut(r) else {
            warn!("release of stale handle {r}");
            return Release::Stale;
        };
        slot.refs -= 1;
        if slot.refs > 0 {
            return Release::Retained(slot.refs);
        }
        let value = slot.value.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(r.index);
        self.live -= 1;
        match value {
            Some(value) => Release::Freed(value),
            None => Release::Stale,
        }
    }

    pub fn get(&self, r: RegistryRef) -> Option<&T> {
        let slot = self.slots.get(r.index as usize)?;
        if slot.generation != r.generation || slot.refs == 0 {
            return None;
        }
        slot.value.as_ref()
    }

    pub fn refcount(&self, r: RegistryRef) -> u32 { self.get(r).map(|_| self.slots[r.index as usize].refs).unwrap_or(0) }

    /// Number of live values.
    pub fn len(&self) -> usize { self.live }
    pub fn is_empty(&self) -> bool { self.live == 0 }

    fn slot_mut(&mut self, r: RegistryRef) -> Option<&mut Slot<T>> {
        let slot = self.slots.get_mut(r.index as usize)?;
        if slot.generation != r.generation || slot.refs == 0 {
            return None;
        }
        Some(slot)
    }
}
