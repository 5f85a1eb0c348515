//! Error types for spark-slots.
//!
//! Only two things can go wrong: a capability is used outside an active
//! slot scope, or a slot name is empty. Absent names, empty content and
//! duplicate registrations are valid states, never errors.

use thiserror::Error;

/// Errors raised by slot scopes, writers and resolvers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    /// A slot capability was requested with no enclosing scope for its
    /// content type. This is a configuration mistake in the component tree.
    #[error("`{capability}` must be obtained within an active slot scope")]
    NoScope {
        /// The capability that was requested.
        capability: &'static str,
    },

    /// Slot names are the registry key and cannot be empty.
    #[error("slot name cannot be empty")]
    EmptyName,
}

/// Result alias used across the crate.
pub type Result<T, E = SlotError> = std::result::Result<T, E>;
