//! Core types for spark-slots.
//!
//! These types define what flows through a slot registry: names, content,
//! transforms and the tagged value that is either of the last two.
//!
//! Identity matters more than equality here. A registry only replaces its
//! snapshot when a value is a *different reference*, so every type that can
//! be stored exposes a `same()` check next to its ordinary `PartialEq`.

use std::borrow::Borrow;
use std::fmt;
use std::rc::Rc;

use crate::error::SlotError;

// =============================================================================
// Slot Name
// =============================================================================

/// Non-empty slot name. The sole key within one registry.
///
/// Cheap to clone (shared `Rc<str>`), and borrowable as `&str` so maps keyed
/// by `SlotName` can be queried with plain string slices.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotName(Rc<str>);

impl SlotName {
    /// Create a slot name, rejecting the empty string.
    pub fn new(name: impl AsRef<str>) -> Result<Self, SlotError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(SlotError::EmptyName);
        }
        Ok(Self(Rc::from(name)))
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for SlotName {
    type Error = SlotError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<String> for SlotName {
    type Error = SlotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Borrow<str> for SlotName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SlotName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SlotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

// =============================================================================
// Content
// =============================================================================

/// Opaque render-ready content, or explicit emptiness.
///
/// Empty content is a real value: a slot set to `Content::empty()` renders
/// nothing, which is different from a slot that was never set (that one
/// renders its default).
pub struct Content<T>(Option<Rc<T>>);

impl<T> Content<T> {
    /// Wrap a value as shared content.
    pub fn new(value: T) -> Self {
        Self(Some(Rc::new(value)))
    }

    /// Content backed by an existing shared value. Keeps its identity.
    pub fn shared(value: Rc<T>) -> Self {
        Self(Some(value))
    }

    /// Explicit empty content.
    pub const fn empty() -> Self {
        Self(None)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Borrow the value, if any.
    pub fn get(&self) -> Option<&T> {
        self.0.as_deref()
    }

    /// Clone out the shared handle, if any.
    pub fn as_rc(&self) -> Option<Rc<T>> {
        self.0.clone()
    }

    /// Reference identity. Two empty contents are the same.
    pub fn same(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<T> Clone for Content<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Default for Content<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: PartialEq> PartialEq for Content<T> {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

impl<T: fmt::Debug> fmt::Debug for Content<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("Content").field(value).finish(),
            None => f.write_str("Content(<empty>)"),
        }
    }
}

impl<T> From<Rc<T>> for Content<T> {
    fn from(value: Rc<T>) -> Self {
        Self::shared(value)
    }
}

// =============================================================================
// Transform
// =============================================================================

/// Function from the resolver's default content to the final content.
///
/// This is how a caller wraps or augments a slot instead of replacing it.
pub struct Transform<T>(Rc<dyn Fn(Content<T>) -> Content<T>>);

impl<T: 'static> Transform<T> {
    pub fn new(f: impl Fn(Content<T>) -> Content<T> + 'static) -> Self {
        Self(Rc::new(f))
    }
}

impl<T> Transform<T> {
    /// Run the transform against a default.
    pub fn apply(&self, default: Content<T>) -> Content<T> {
        (self.0)(default)
    }

    /// Reference identity of the underlying function.
    pub fn same(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl<T> Clone for Transform<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Transform<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(<fn>)")
    }
}

// =============================================================================
// Slot Value
// =============================================================================

/// What a writer stores under a slot name.
///
/// A tagged union rather than a runtime "is it callable" probe, so resolution
/// is an exhaustive match.
pub enum SlotValue<T> {
    /// Replace the default verbatim (including with empty content).
    Content(Content<T>),
    /// Derive the output from the default.
    Transform(Transform<T>),
}

impl<T> SlotValue<T> {
    /// Shorthand for `SlotValue::Content(Content::new(value))`.
    pub fn content(value: T) -> Self {
        Self::Content(Content::new(value))
    }

    /// Explicit empty override.
    pub const fn empty() -> Self {
        Self::Content(Content::empty())
    }

    pub fn is_transform(&self) -> bool {
        matches!(self, Self::Transform(_))
    }

    /// Reference identity. Values of different kinds are never the same.
    pub fn same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Content(a), Self::Content(b)) => a.same(b),
            (Self::Transform(a), Self::Transform(b)) => a.same(b),
            _ => false,
        }
    }

    /// Decide the output for this value given the resolver's default.
    pub fn resolve(&self, default: Content<T>) -> Content<T> {
        match self {
            Self::Content(content) => content.clone(),
            Self::Transform(transform) => transform.apply(default),
        }
    }
}

impl<T: 'static> SlotValue<T> {
    /// Shorthand for `SlotValue::Transform(Transform::new(f))`.
    pub fn transform(f: impl Fn(Content<T>) -> Content<T> + 'static) -> Self {
        Self::Transform(Transform::new(f))
    }
}

impl<T> Clone for SlotValue<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Content(content) => Self::Content(content.clone()),
            Self::Transform(transform) => Self::Transform(transform.clone()),
        }
    }
}

impl<T> Default for SlotValue<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for SlotValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content(content) => content.fmt(f),
            Self::Transform(transform) => transform.fmt(f),
        }
    }
}

impl<T> From<Content<T>> for SlotValue<T> {
    fn from(value: Content<T>) -> Self {
        Self::Content(value)
    }
}

impl<T> From<Transform<T>> for SlotValue<T> {
    fn from(value: Transform<T>) -> Self {
        Self::Transform(value)
    }
}

// =============================================================================
// Slot Change (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Kinds of change a commit applied to a registry.
    ///
    /// Combine with bitwise OR: `SlotChange::ADDED | SlotChange::REMOVED`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SlotChange: u8 {
        const NONE = 0;
        const ADDED = 1 << 0;
        const UPDATED = 1 << 1;
        const REMOVED = 1 << 2;
    }
}
