//! Slot Engine - Registry and scope.
//!
//! The engine manages the core data structures:
//! - Registry: versioned copy-on-write map from slot name to slot value
//! - Scope: owns one registry, exposes it ambiently, queues writer effects
//!
//! # Architecture
//!
//! A registry is never shared between scopes, and nothing outside a scope can
//! reach its registry once the last handle is gone:
//!
//! ```text
//! SlotScope ─owns→ Registry ─publishes→ Rc<SlotMap> (snapshot, identity = change)
//!     │
//!     ├── pending writes (applied by commit)
//!     └── subscribers    (told after each effective change)
//! ```

mod registry;
mod scope;

pub use registry::*;
pub use scope::{
    current_scope, has_slot, remove_slot_value, scope_depth, set_slot_value, slot_value,
    slot_values, use_slots, CommitReport, ScopeBuilder, ScopeOptions, SlotScope, Subscription,
};

pub(crate) use scope::{require_scope, WeakSlotScope, WriterId};
