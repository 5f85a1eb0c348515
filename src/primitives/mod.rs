//! Slot Primitives - Writer and resolver components.
//!
//! This module provides the two components a tree uses to talk to its scope:
//! - [`SlotWriter`] / [`fill_slot`] - Registers content or a transform under a name
//! - [`SlotResolver`] / [`resolve_slot`] - Renders a named slot given a default
//!
//! # Lifecycle
//!
//! Resolvers read on every render pass. Writers only write in the commit
//! phase, so a pass never observes a half-applied write:
//!
//! ```ignore
//! let scope = SlotScope::<String>::establish();
//!
//! // Pass 1: resolver renders the default, writer queues its override.
//! let header = SlotResolver::within(&scope, "header")?;
//! let fill = SlotWriter::within(&scope, "header", SlotValue::content("Inbox".into()))?;
//! header.render(Content::new("Untitled".into()))?;   // "Untitled"
//! scope.commit();                                      // header is now stale
//!
//! // Pass 2
//! header.render(Content::new("Untitled".into()))?;   // "Inbox"
//! ```

mod types;
mod resolver;
mod writer;

pub use types::*;
pub use resolver::{resolve_slot, SlotResolver};
pub use writer::{fill_slot, SlotWriter};
