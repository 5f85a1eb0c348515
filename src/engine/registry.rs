//! Slot Registry - Versioned, copy-on-write name → value mapping.
//!
//! The registry never mutates a published snapshot. Every effective change
//! builds a new `Rc<SlotMap>` and bumps the version, so consumers can skip
//! work with a pointer comparison:
//!
//! ```text
//! set("a", v1)  → snapshot #1, version 1
//! set("a", v1)  → snapshot #1, version 1   (same reference: no-op)
//! set("a", v2)  → snapshot #2, version 2
//! remove("b")   → snapshot #2, version 2   (absent: no-op)
//! remove("a")   → snapshot #3, version 3
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use crate::types::{SlotChange, SlotName, SlotValue};

/// Immutable snapshot of every registered slot.
pub type SlotMap<T> = HashMap<SlotName, SlotValue<T>>;

/// Mapping from slot name to slot value with identity-preserving updates.
pub struct Registry<T> {
    map: Rc<SlotMap<T>>,
    version: u64,
}

impl<T> Registry<T> {
    /// Create an empty registry at version 0.
    pub fn new() -> Self {
        Self {
            map: Rc::new(HashMap::new()),
            version: 0,
        }
    }

    /// The current snapshot. Identity changes only when content changed.
    pub fn snapshot(&self) -> Rc<SlotMap<T>> {
        Rc::clone(&self.map)
    }

    /// Number of snapshot replacements so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn get(&self, name: &str) -> Option<&SlotValue<T>> {
        self.map.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Registered names, sorted for stable output.
    pub fn names(&self) -> Vec<SlotName> {
        let mut names: Vec<SlotName> = self.map.keys().cloned().collect();
        names.sort();
        names
    }

    /// Store `value` under `name`.
    ///
    /// Returns the change applied, or `None` when `value` is the same
    /// reference already stored (snapshot left untouched).
    pub fn set(&mut self, name: SlotName, value: SlotValue<T>) -> Option<Replaced<T>> {
        let change = match self.map.get(&name) {
            Some(current) if current.same(&value) => return None,
            Some(_) => SlotChange::UPDATED,
            None => SlotChange::ADDED,
        };

        let mut next = (*self.map).clone();
        next.insert(name, value);
        Some(self.publish(change, next))
    }

    /// Remove `name`. Returns `None` when it was not present.
    pub fn remove(&mut self, name: &str) -> Option<Replaced<T>> {
        if !self.map.contains_key(name) {
            return None;
        }

        let mut next = (*self.map).clone();
        next.remove(name);
        Some(self.publish(SlotChange::REMOVED, next))
    }

    fn publish(&mut self, change: SlotChange, next: SlotMap<T>) -> Replaced<T> {
        let previous = std::mem::replace(&mut self.map, Rc::new(next));
        self.version += 1;
        Replaced { change, previous }
    }
}

/// An effective registry change.
///
/// Carries the displaced snapshot: dropping it may drop the last reference to
/// an overwritten value, and with it arbitrary user drop glue. Callers holding
/// a borrow of the registry must keep it until that borrow is released.
#[derive(Debug)]
#[must_use = "dropping the displaced snapshot may run drop glue of overwritten values"]
pub struct Replaced<T> {
    pub change: SlotChange,
    pub previous: Rc<SlotMap<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}
