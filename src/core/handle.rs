//! Fixed-capacity slab with generation-checked handles.
//!
//! Both the surface table and the window table sit on top of this. A handle
//! is a slot index plus the generation the slot had when the value was
//! inserted; removing a value bumps the generation, so a handle that outlives
//! its value resolves to nothing instead of aliasing whatever reuses the slot.
//!
//! Handles have a stable external form: the 1-based slot index, with `0`
//! reserved for "none". This is the id the world/renderer sees.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("table is full (capacity {capacity})")]
pub struct CapacityExhausted {
    pub capacity: usize,
}

/// Typed handle into a [`HandleTable<T>`].
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation, _marker: PhantomData }
    }

    /// External 1-based id. Never `0`.
    pub fn id(&self) -> u32 {
        self.index + 1
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.id(), self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Fixed-capacity arena with a free list.
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    capacity: usize,
    len: usize,
}

impl<T> HandleTable<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            capacity,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len >= self.capacity
    }

    /// Number of slots ever handed out, live or not.
    pub fn slots_used(&self) -> usize {
        self.slots.len()
    }

    /// Store `value`, preferring the most recently freed slot.
    pub fn insert(&mut self, value: T) -> Result<Handle<T>, CapacityExhausted> {
        if self.is_full() {
            return Err(CapacityExhausted { capacity: self.capacity });
        }

        let handle = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            Handle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { generation: 0, value: Some(value) });
            Handle::new(index, 0)
        };

        self.len += 1;
        Ok(handle)
    }

    /// Take the value out and release its slot for reuse.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.value.as_mut())
    }

    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Resolve an external 1-based id to the live handle in that slot.
    pub fn handle_for_id(&self, id: u32) -> Option<Handle<T>> {
        let index = id.checked_sub(1)?;
        let slot = self.slots.get(index as usize)?;
        slot.value.as_ref()?;
        Some(Handle::new(index, slot.generation))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value
                .as_ref()
                .map(|value| (Handle::new(index as u32, slot.generation), value))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> + '_ {
        self.slots.iter_mut().enumerate().filter_map(|(index, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|value| (Handle::new(index as u32, generation), value))
        })
    }

    pub fn handles(&self) -> Vec<Handle<T>> {
        self.iter().map(|(handle, _)| handle).collect()
    }
}

impl<T: fmt::Debug> fmt::Debug for HandleTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ids_are_one_based() {
        let mut table = HandleTable::with_capacity(4);
        let a = table.insert("a").unwrap();
        let b = table.insert("b").unwrap();
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
        assert_eq!(table.handle_for_id(2), Some(b));
        assert_eq!(table.handle_for_id(0), None);
        assert_eq!(table.handle_for_id(3), None);
    }

    #[test]
    fn capacity_is_enforced() {
        let mut table = HandleTable::with_capacity(1);
        table.insert(1).unwrap();
        assert_eq!(table.insert(2), Err(CapacityExhausted { capacity: 1 }));
    }

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut table = HandleTable::with_capacity(2);
        let old = table.insert("old").unwrap();
        assert_eq!(table.remove(old), Some("old"));

        let new = table.insert("new").unwrap();
        assert_eq!(new.id(), old.id());
        assert_ne!(new, old);
        assert_eq!(table.get(old), None);
        assert_eq!(table.get(new), Some(&"new"));
        assert_eq!(table.remove(old), None);
        assert_eq!(table.len(), 1);
    }

    proptest! {
        #[test]
        fn live_handles_always_resolve(ops in proptest::collection::vec(any::<bool>(), 1..64)) {
            let mut table = HandleTable::with_capacity(16);
            let mut live: Vec<Handle<usize>> = Vec::new();
            let mut dead: Vec<Handle<usize>> = Vec::new();

            for (step, insert) in ops.into_iter().enumerate() {
                if insert || live.is_empty() {
                    if let Ok(handle) = table.insert(step) {
                        live.push(handle);
                    }
                } else {
                    let handle = live.remove(step % live.len());
                    prop_assert_eq!(table.remove(handle).is_some(), true);
                    dead.push(handle);
                }

                prop_assert_eq!(table.len(), live.len());
                for handle in &live {
                    prop_assert!(table.contains(*handle));
                    prop_assert_eq!(table.handle_for_id(handle.id()), Some(*handle));
                }
                for handle in &dead {
                    prop_assert!(!table.contains(*handle));
                }
            }
        }
    }
}
