//! Slot Writer - Registers a value under a name for its mounted lifetime.
//!
//! A writer renders nothing itself. It is a side-effecting node:
//!
//! 1. On creation it queues `set(name, value)` on its scope
//! 2. On `update()` with a *different reference* it queues a new set
//! 3. The host's `commit()` applies queued writes after the render pass
//! 4. On drop it cancels anything still queued and removes its registration
//!
//! Step 4 runs on every exit path (explicit unmount, the parent dropping its
//! children, unwinding), so a registration never outlives its writer.
//!
//! # Example
//!
//! ```ignore
//! use spark_slots::{fill_slot, SlotScope, SlotValue};
//!
//! let scope = SlotScope::<String>::establish();
//! let writer = scope.enter(|| fill_slot("header", SlotValue::content("Inbox".to_string())))?;
//! scope.commit();
//!
//! // Later: unmount
//! drop(writer);
//! ```

use crate::engine::{require_scope, SlotScope, WeakSlotScope, WriterId};
use crate::error::Result;
use crate::primitives::Cleanup;
use crate::types::{SlotName, SlotValue};

/// Mounted registration of one slot value.
pub struct SlotWriter<T: 'static> {
    id: WriterId,
    name: SlotName,
    current: SlotValue<T>,
    scope: WeakSlotScope<T>,
}

impl<T: 'static> SlotWriter<T> {
    /// Mount a writer in the innermost active scope for `T`.
    pub fn new(name: impl AsRef<str>, value: impl Into<SlotValue<T>>) -> Result<Self> {
        let scope = require_scope::<T>("SlotWriter")?;
        Self::within(&scope, name, value)
    }

    /// Mount a writer in an explicitly provided scope.
    pub fn within(
        scope: &SlotScope<T>,
        name: impl AsRef<str>,
        value: impl Into<SlotValue<T>>,
    ) -> Result<Self> {
        let name = SlotName::new(name)?;
        let value = value.into();
        let id = scope.allocate_writer();

        tracing::debug!(
            scope = scope.scope_id(),
            writer = id,
            slot = %name,
            transform = value.is_transform(),
            "slot writer mounted"
        );
        scope.queue_write(id, name.clone(), value.clone());

        Ok(Self {
            id,
            name,
            current: value,
            scope: scope.downgrade(),
        })
    }

    pub fn name(&self) -> &SlotName {
        &self.name
    }

    /// The value this writer last asked to register.
    pub fn value(&self) -> &SlotValue<T> {
        &self.current
    }

    /// Re-render with a new value.
    ///
    /// Returns `true` if a write was queued. A reference-identical value
    /// queues nothing, so repeated renders with the same value are free.
    pub fn update(&mut self, value: impl Into<SlotValue<T>>) -> bool {
        let value = value.into();
        if value.same(&self.current) {
            return false;
        }
        self.current = value;

        let Some(scope) = self.scope.upgrade() else {
            return false;
        };
        tracing::trace!(
            scope = scope.scope_id(),
            writer = self.id,
            slot = %self.name,
            "slot writer updated"
        );
        scope.queue_write(self.id, self.name.clone(), self.current.clone());
        true
    }

    /// Unmount now. Equivalent to dropping the writer.
    pub fn unmount(self) {}
}

impl<T: 'static> Drop for SlotWriter<T> {
    fn drop(&mut self) {
        let Some(scope) = self.scope.upgrade() else {
            return;
        };
        tracing::debug!(
            scope = scope.scope_id(),
            writer = self.id,
            slot = %self.name,
            "slot writer unmounted"
        );
        scope.release_writer(self.id, &self.name);
    }
}

impl<T: 'static> From<SlotWriter<T>> for Cleanup {
    fn from(writer: SlotWriter<T>) -> Self {
        Box::new(move || drop(writer))
    }
}

impl<T: 'static> std::fmt::Debug for SlotWriter<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotWriter")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("transform", &self.current.is_transform())
            .finish()
    }
}

/// Mount a writer for `name` in the innermost active scope.
///
/// Pass `SlotValue::empty()` (or `SlotValue::default()`) for an explicit
/// empty override.
pub fn fill_slot<T: 'static>(name: &str, value: impl Into<SlotValue<T>>) -> Result<SlotWriter<T>> {
    SlotWriter::new(name, value)
}
