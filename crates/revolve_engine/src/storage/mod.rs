//! Checkpoint slot storage.
//!
//! Slots are addressed by index, `0..capacity`, and each holds one encoded
//! [`Payload`] labelled with the timestep it was taken at. The scheduler
//! decides which slot to use; a store only keeps what it is given.
//!
//! # Example
//!
//! ```rust
//! use revolve_engine::compression::Payload;
//! use revolve_engine::storage::{MemoryStore, SlotStore};
//! use revolve_engine::Field;
//!
//! let mut store = MemoryStore::new(2);
//! store.store(0, 0, Payload::Raw(Field::zeros(vec![4]))).unwrap();
//! assert_eq!(store.fetch(0).unwrap().timestep, 0);
//! assert!(store.fetch(1).is_none());
//! assert!(store.store(2, 7, Payload::Encoded(vec![])).is_err());
//! ```

mod budget;

pub use budget::MemoryBudget;

use thiserror::Error;
use tracing::warn;

use crate::compression::Payload;

/// Errors raised by a slot store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Slot index not below the store capacity.
    #[error("Slot {slot} out of range (capacity: {capacity})")]
    SlotOutOfRange {
        /// Requested slot
        slot: usize,
        /// Number of slots
        capacity: usize,
    },

    /// Storing the payload would exceed the byte budget.
    #[error("Memory budget exceeded: {current} bytes > {max} bytes")]
    MemoryExceeded {
        /// Bytes held after the store
        current: usize,
        /// Budget
        max: usize,
    },
}

/// Payload held by a slot.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredSlot {
    /// Timestep the snapshot was taken at
    pub timestep: usize,

    /// Encoded snapshot
    pub payload: Payload,
}

/// Indexed storage for checkpoint payloads.
pub trait SlotStore {
    /// Number of slots.
    fn capacity(&self) -> usize;

    /// Stores `payload` in `slot`, replacing any previous content.
    fn store(&mut self, slot: usize, timestep: usize, payload: Payload) -> Result<(), StoreError>;

    /// Content of `slot`, if it was ever written.
    fn fetch(&self, slot: usize) -> Option<&StoredSlot>;

    /// Empties every slot.
    fn clear(&mut self);

    /// Bytes currently held.
    fn stored_bytes(&self) -> usize;
}

/// In-memory slot store, optionally bounded by a [`MemoryBudget`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    slots: Vec<Option<StoredSlot>>,
    stored_bytes: usize,
    peak_bytes: usize,
    budget: Option<MemoryBudget>,
}

impl MemoryStore {
    /// Creates a store with `capacity` empty slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            stored_bytes: 0,
            peak_bytes: 0,
            budget: None,
        }
    }

    /// Bounds the bytes held by the store.
    pub fn with_budget(mut self, budget: MemoryBudget) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Memory budget if set.
    pub fn budget(&self) -> Option<&MemoryBudget> {
        self.budget.as_ref()
    }

    /// Largest number of bytes held at once.
    pub fn peak_bytes(&self) -> usize {
        self.peak_bytes
    }

    /// Number of slots holding a payload.
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

impl SlotStore for MemoryStore {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn store(&mut self, slot: usize, timestep: usize, payload: Payload) -> Result<(), StoreError> {
        let capacity = self.slots.len();
        let entry = self
            .slots
            .get_mut(slot)
            .ok_or(StoreError::SlotOutOfRange { slot, capacity })?;

        let replaced = entry.as_ref().map_or(0, |old| old.payload.size_bytes());
        let current = self.stored_bytes - replaced + payload.size_bytes();
        if let Some(budget) = &self.budget {
            if !budget.is_within_budget(current) {
                return Err(StoreError::MemoryExceeded {
                    current,
                    max: budget.max_bytes(),
                });
            }
            if budget.is_warning(current) {
                warn!(
                    current,
                    max = budget.max_bytes(),
                    "checkpoint storage above warning threshold"
                );
            }
        }

        *entry = Some(StoredSlot { timestep, payload });
        self.stored_bytes = current;
        self.peak_bytes = self.peak_bytes.max(current);
        Ok(())
    }

    fn fetch(&self, slot: usize) -> Option<&StoredSlot> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.stored_bytes = 0;
    }

    fn stored_bytes(&self) -> usize {
        self.stored_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;

    fn encoded(len: usize) -> Payload {
        Payload::Encoded(vec![0u8; len])
    }

    #[test]
    fn test_store_new() {
        let store = MemoryStore::new(5);
        assert_eq!(store.capacity(), 5);
        assert_eq!(store.occupied(), 0);
        assert_eq!(store.stored_bytes(), 0);
    }

    #[test]
    fn test_store_and_fetch() {
        let mut store = MemoryStore::new(3);
        let field = Field::filled(vec![2, 2], 1.5);
        store.store(1, 40, Payload::Raw(field.clone())).unwrap();

        let slot = store.fetch(1).unwrap();
        assert_eq!(slot.timestep, 40);
        assert_eq!(slot.payload, Payload::Raw(field.clone()));
        assert_eq!(store.stored_bytes(), field.memory_size());
    }

    #[test]
    fn test_store_replaces_slot() {
        let mut store = MemoryStore::new(2);
        store.store(0, 0, encoded(100)).unwrap();
        store.store(0, 8, encoded(30)).unwrap();

        assert_eq!(store.fetch(0).unwrap().timestep, 8);
        assert_eq!(store.stored_bytes(), 30);
        assert_eq!(store.peak_bytes(), 100);
        assert_eq!(store.occupied(), 1);
    }

    #[test]
    fn test_store_out_of_range() {
        let mut store = MemoryStore::new(2);
        assert_eq!(
            store.store(2, 5, encoded(1)),
            Err(StoreError::SlotOutOfRange {
                slot: 2,
                capacity: 2
            })
        );
        assert!(store.fetch(7).is_none());
    }

    #[test]
    fn test_store_budget_exceeded() {
        let mut store = MemoryStore::new(3).with_budget(MemoryBudget::new(150));
        store.store(0, 0, encoded(100)).unwrap();
        let err = store.store(1, 4, encoded(60)).unwrap_err();
        assert_eq!(
            err,
            StoreError::MemoryExceeded {
                current: 160,
                max: 150
            }
        );
        // Rejected payloads leave the store untouched.
        assert!(store.fetch(1).is_none());
        assert_eq!(store.stored_bytes(), 100);

        // Replacing a slot frees its old bytes first.
        store.store(0, 0, encoded(90)).unwrap();
        store.store(1, 4, encoded(60)).unwrap();
        assert_eq!(store.stored_bytes(), 150);
    }

    #[test]
    fn test_store_clear() {
        let mut store = MemoryStore::new(2);
        store.store(0, 0, encoded(10)).unwrap();
        store.store(1, 3, encoded(10)).unwrap();
        store.clear();
        assert_eq!(store.occupied(), 0);
        assert_eq!(store.stored_bytes(), 0);
        assert_eq!(store.peak_bytes(), 20);
    }
}
