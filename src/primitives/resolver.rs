//! Slot Resolver - Decides what a named slot renders.
//!
//! Resolution is total and deterministic:
//!
//! | Registry entry     | Output              |
//! |--------------------|---------------------|
//! | none               | `default`, verbatim |
//! | `Transform(f)`     | `f(default)`        |
//! | `Content(v)`       | `v`, verbatim       |
//!
//! Once an entry exists there is no fallback to the default, even if the
//! entry is empty content. Emptiness is an explicit override.
//!
//! [`resolve_slot`] is the one-shot read. [`SlotResolver`] is the component
//! form: it remembers which version it rendered against and is marked stale
//! when a commit touches its slot, so the host knows to schedule another pass.

use std::cell::Cell;
use std::rc::Rc;

use crate::engine::{require_scope, SlotScope, Subscription, WeakSlotScope};
use crate::error::{Result, SlotError};
use crate::primitives::InvalidateCallback;
use crate::types::{Content, SlotName};

/// Resolve `name` against the innermost active scope.
pub fn resolve_slot<T: 'static>(name: &str, default: Content<T>) -> Result<Content<T>> {
    Ok(require_scope::<T>("resolve_slot")?.resolve(name, default))
}

/// Mounted reader of one slot.
pub struct SlotResolver<T: 'static> {
    name: SlotName,
    scope: WeakSlotScope<T>,
    stale: Rc<Cell<bool>>,
    rendered_version: Cell<Option<u64>>,
    _subscription: Subscription,
}

impl<T: 'static> SlotResolver<T> {
    /// Mount a resolver in the innermost active scope for `T`.
    pub fn new(name: impl AsRef<str>) -> Result<Self> {
        let scope = require_scope::<T>("SlotResolver")?;
        Self::within(&scope, name)
    }

    /// Mount a resolver in an explicitly provided scope.
    pub fn within(scope: &SlotScope<T>, name: impl AsRef<str>) -> Result<Self> {
        Self::build(scope, name, None)
    }

    /// Mount a resolver that calls `on_invalidate` when its slot changes.
    pub fn with_invalidate(
        scope: &SlotScope<T>,
        name: impl AsRef<str>,
        on_invalidate: impl Fn() + 'static,
    ) -> Result<Self> {
        Self::build(scope, name, Some(Rc::new(on_invalidate)))
    }

    fn build(
        scope: &SlotScope<T>,
        name: impl AsRef<str>,
        on_invalidate: Option<InvalidateCallback>,
    ) -> Result<Self> {
        let name = SlotName::new(name)?;
        let stale = Rc::new(Cell::new(false));

        let watched = name.clone();
        let stale_flag = stale.clone();
        let subscription = scope.subscribe(move |report| {
            if !report.touches(watched.as_str()) {
                return;
            }
            stale_flag.set(true);
            if let Some(callback) = &on_invalidate {
                callback();
            }
        });

        Ok(Self {
            name,
            scope: scope.downgrade(),
            stale,
            rendered_version: Cell::new(None),
            _subscription: subscription,
        })
    }

    pub fn name(&self) -> &SlotName {
        &self.name
    }

    /// Render the slot for this pass.
    ///
    /// Fails with [`SlotError::NoScope`] once the owning scope is gone.
    pub fn render(&self, default: Content<T>) -> Result<Content<T>> {
        let scope = self
            .scope
            .upgrade()
            .ok_or(SlotError::NoScope { capability: "SlotResolver::render" })?;
        self.stale.set(false);
        self.rendered_version.set(Some(scope.version()));
        Ok(scope.resolve(self.name.as_str(), default))
    }

    /// Whether a commit changed this slot since the last render.
    pub fn is_stale(&self) -> bool {
        self.stale.get()
    }

    /// Registry version seen by the last render, if any.
    pub fn rendered_version(&self) -> Option<u64> {
        self.rendered_version.get()
    }
}

impl<T: 'static> std::fmt::Debug for SlotResolver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotResolver")
            .field("name", &self.name)
            .field("stale", &self.stale.get())
            .field("rendered_version", &self.rendered_version.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SlotValue;

    fn text(s: &str) -> Content<String> {
        Content::new(s.to_string())
    }

    #[test]
    fn test_resolve_outside_scope_fails() {
        let err = resolve_slot("main", text("A")).unwrap_err();
        assert_eq!(err, SlotError::NoScope { capability: "resolve_slot" });
        assert!(SlotResolver::<String>::new("main").is_err());
    }

    #[test]
    fn test_unset_renders_default_verbatim() {
        let scope: SlotScope<String> = SlotScope::establish();
        let default = text("A");

        let out = scope.enter(|| resolve_slot("main", default.clone())).unwrap();
        assert!(out.same(&default));
    }

    #[test]
    fn test_empty_override_does_not_fall_back() {
        let scope: SlotScope<String> = SlotScope::establish();
        scope.set_slot_value("main", SlotValue::empty()).unwrap();

        let out = scope.enter(|| resolve_slot("main", text("A"))).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_transform_receives_default() {
        let scope: SlotScope<String> = SlotScope::establish();
        scope
            .set_slot_value(
                "main",
                SlotValue::transform(|c: Content<String>| {
                    Content::new(format!("<{}>", c.get().map(String::as_str).unwrap_or("")))
                }),
            )
            .unwrap();

        let out = scope.enter(|| resolve_slot("main", text("A"))).unwrap();
        assert_eq!(out, text("<A>"));
    }

    #[test]
    fn test_resolver_goes_stale_on_its_slot_only() {
        let scope: SlotScope<String> = SlotScope::establish();
        let resolver = SlotResolver::within(&scope, "main").unwrap();
        assert_eq!(resolver.render(text("A")).unwrap(), text("A"));
        assert_eq!(resolver.rendered_version(), Some(0));

        scope.set_slot_value("other", SlotValue::content("x".to_string())).unwrap();
        assert!(!resolver.is_stale());

        scope.set_slot_value("main", SlotValue::content("B".to_string())).unwrap();
        assert!(resolver.is_stale());

        assert_eq!(resolver.render(text("A")).unwrap(), text("B"));
        assert!(!resolver.is_stale());
        assert_eq!(resolver.rendered_version(), Some(2));
    }

    #[test]
    fn test_invalidate_callback_runs_after_commit() {
        let scope: SlotScope<String> = SlotScope::establish();
        let scheduled = Rc::new(Cell::new(0));
        let scheduled_clone = scheduled.clone();
        let _resolver = SlotResolver::with_invalidate(&scope, "main", move || {
            scheduled_clone.set(scheduled_clone.get() + 1);
        })
        .unwrap();

        let _writer = crate::primitives::SlotWriter::within(
            &scope,
            "main",
            SlotValue::content("B".to_string()),
        )
        .unwrap();
        assert_eq!(scheduled.get(), 0);

        scope.commit();
        assert_eq!(scheduled.get(), 1);
    }

    #[test]
    fn test_dropping_resolver_unsubscribes() {
        let scope: SlotScope<String> = SlotScope::establish();
        let resolver = SlotResolver::within(&scope, "main").unwrap();
        assert_eq!(scope.subscriber_count(), 1);

        drop(resolver);
        assert_eq!(scope.subscriber_count(), 0);
    }

    #[test]
    fn test_render_after_scope_teardown_fails() {
        let scope: SlotScope<String> = SlotScope::establish();
        let resolver = SlotResolver::within(&scope, "main").unwrap();
        drop(scope);

        assert!(matches!(
            resolver.render(text("A")),
            Err(SlotError::NoScope { .. })
        ));
    }
}
