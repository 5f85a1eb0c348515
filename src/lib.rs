//! # spark-slots
//!
//! Named, overridable slots for spark-tui component trees.
//!
//! A component declares a slot by name with default content. A caller higher
//! up the tree overrides that slot, or wraps its default with a transform,
//! without threading props through every layer in between.
//!
//! ## Architecture
//!
//! ```text
//! SlotScope (owns Registry)
//!   ├── SlotWriter("header", Content | Transform)   queues writes, commits later
//!   └── SlotResolver("header") + default             reads every render pass
//! ```
//!
//! The registry is copy-on-write: an update that stores the same reference
//! keeps the current snapshot, so consumers can skip re-rendering with a
//! pointer comparison. Writers only mutate during the host's commit phase,
//! and always release their registration when dropped.
//!
//! ## Modules
//!
//! - [`types`] - Slot names, content, transforms, slot values, change flags
//! - [`engine`] - Registry and scope (ambient lookup, commit queue, subscriptions)
//! - [`primitives`] - Writer and resolver components
//! - [`error`] - The crate's error type
//!
//! ## Example
//!
//! ```
//! use spark_slots::{Content, SlotResolver, SlotScope, SlotValue, SlotWriter};
//!
//! let scope = SlotScope::<String>::establish();
//! let main = SlotResolver::within(&scope, "main")?;
//! let default = || Content::new("A".to_string());
//! assert_eq!(main.render(default())?.get().map(String::as_str), Some("A"));
//!
//! let writer = SlotWriter::within(&scope, "main", SlotValue::content("B".to_string()))?;
//! scope.commit();
//! assert_eq!(main.render(default())?.get().map(String::as_str), Some("B"));
//!
//! drop(writer);
//! assert_eq!(main.render(default())?.get().map(String::as_str), Some("A"));
//! # Ok::<(), spark_slots::SlotError>(())
//! ```

pub mod engine;
pub mod error;
pub mod primitives;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use error::{Result, SlotError};

pub use engine::{
    current_scope, has_slot, remove_slot_value, scope_depth, set_slot_value, slot_value,
    slot_values, use_slots, CommitReport, Registry, Replaced, ScopeBuilder, ScopeOptions,
    SlotMap, SlotScope, Subscription,
};

pub use primitives::{
    fill_slot, resolve_slot, Cleanup, InvalidateCallback, SlotResolver, SlotWriter,
};
