//! Primitive types - Cleanup and callbacks.

use std::rc::Rc;

// =============================================================================
// Cleanup Function
// =============================================================================

/// Cleanup function returned by components.
///
/// Call this to unmount the component and release what it registered.
pub type Cleanup = Box<dyn FnOnce()>;

// =============================================================================
// Callback Types
// =============================================================================

/// Invalidation callback for resolvers.
///
/// Called after a commit changed the resolver's slot. The host uses it to
/// schedule the next render pass; it must not re-render synchronously.
pub type InvalidateCallback = Rc<dyn Fn()>;
