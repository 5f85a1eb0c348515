//! Slot Scope - Subtree-owned registry with ambient lookup and a commit queue.
//!
//! A scope owns exactly one [`Registry`] for as long as any [`SlotScope`]
//! handle to it is alive. Descendants find it in one of two ways:
//!
//! - explicitly, by being handed a `SlotScope<T>` clone
//! - ambiently, via [`use_slots`] while inside [`SlotScope::enter`]
//!
//! # Pattern: Scope Stack
//!
//! Like the parent context used for nested component creation, active scopes
//! live on a thread-local stack. `enter()` pushes, runs the closure, and pops
//! on every exit path. Lookup walks the stack from the top and returns the
//! innermost scope whose content type matches, so independent slot systems
//! (different `T`) can nest without seeing each other.
//!
//! # Pattern: Commit Queue
//!
//! Writers never touch the registry while the host is rendering. They queue
//! a write, and the host calls [`SlotScope::commit`] once the pass is done:
//!
//! ```text
//! render pass:  resolvers read snapshot N   writers queue set(...)
//! commit:       queued writes applied → snapshot N+1 → subscribers notified
//! next pass:    stale resolvers re-render against snapshot N+1
//! ```
//!
//! Direct capability calls (`set_slot_value`, `remove_slot_value`) and writer
//! teardown apply immediately; the host is expected to issue them at commit
//! time as well.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::engine::registry::{Registry, SlotMap};
use crate::error::{Result, SlotError};
use crate::types::{Content, SlotChange, SlotName, SlotValue};

// =============================================================================
// Options
// =============================================================================

/// Per-scope options. There is no other configuration surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeOptions {
    /// Label recorded on every log event of this scope.
    pub label: Option<String>,
    /// Log a warning when two live writers register the same name.
    pub warn_on_collision: bool,
}

impl Default for ScopeOptions {
    fn default() -> Self {
        Self {
            label: None,
            warn_on_collision: true,
        }
    }
}

/// Builder returned by [`SlotScope::builder`].
pub struct ScopeBuilder<T> {
    options: ScopeOptions,
    _content: PhantomData<fn() -> T>,
}

impl<T: 'static> ScopeBuilder<T> {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.options.label = Some(label.into());
        self
    }

    pub fn warn_on_collision(mut self, warn: bool) -> Self {
        self.options.warn_on_collision = warn;
        self
    }

    pub fn establish(self) -> SlotScope<T> {
        SlotScope::with_options(self.options)
    }
}

// =============================================================================
// Commit Report
// =============================================================================

/// Summary of one effective registry change, handed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReport {
    /// Registry version after the change.
    pub version: u64,
    /// Every kind of change applied.
    pub changes: SlotChange,
    /// Names whose entry changed, sorted.
    pub names: Vec<SlotName>,
}

impl CommitReport {
    /// Whether `name` was touched by this change.
    pub fn touches(&self, name: &str) -> bool {
        self.names.iter().any(|n| n.as_str() == name)
    }

    fn absorb(&mut self, other: CommitReport) {
        self.version = other.version;
        self.changes |= other.changes;
        for name in other.names {
            if let Err(at) = self.names.binary_search(&name) {
                self.names.insert(at, name);
            }
        }
    }
}

// =============================================================================
// Subscription
// =============================================================================

type Subscriber = Rc<dyn Fn(&CommitReport)>;

/// RAII guard that unsubscribes its callback on drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Unsubscribe now instead of at drop.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

// =============================================================================
// Scope State
// =============================================================================

/// Identity of one writer within its scope.
pub(crate) type WriterId = u64;

struct PendingWrite<T> {
    writer: WriterId,
    name: SlotName,
    value: SlotValue<T>,
}

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(0);

pub(crate) struct ScopeInner<T> {
    id: u64,
    options: ScopeOptions,
    registry: RefCell<Registry<T>>,
    pending: RefCell<Vec<PendingWrite<T>>>,
    /// Writer whose committed registration currently backs each name.
    owners: RefCell<HashMap<SlotName, WriterId>>,
    subscribers: RefCell<Vec<(usize, Subscriber)>>,
    next_subscriber: Cell<usize>,
    next_writer: Cell<WriterId>,
    committing: Cell<bool>,
    recommit: Cell<bool>,
    collisions: Cell<u64>,
}

impl<T> ScopeInner<T> {
    fn label(&self) -> &str {
        self.options.label.as_deref().unwrap_or("")
    }
}

impl<T> Drop for ScopeInner<T> {
    fn drop(&mut self) {
        let slots = self.registry.get_mut().len();
        tracing::debug!(
            scope = self.id,
            label = self.label(),
            slots,
            "slot scope discarded"
        );
    }
}

/// Resets the re-entrancy flag even if a subscriber unwinds.
struct CommitGuard<'a>(&'a Cell<bool>);

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// =============================================================================
// Slot Scope
// =============================================================================

/// Handle to a scope and its registry. Cloning shares the same registry.
pub struct SlotScope<T: 'static> {
    inner: Rc<ScopeInner<T>>,
}

impl<T: 'static> Clone for SlotScope<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> std::fmt::Debug for SlotScope<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotScope")
            .field("id", &self.inner.id)
            .field("label", &self.inner.options.label)
            .field("version", &self.version())
            .field("slots", &self.slot_names())
            .finish()
    }
}

impl<T: 'static> SlotScope<T> {
    /// Establish a scope with an empty registry and default options.
    pub fn establish() -> Self {
        Self::with_options(ScopeOptions::default())
    }

    pub fn builder() -> ScopeBuilder<T> {
        ScopeBuilder {
            options: ScopeOptions::default(),
            _content: PhantomData,
        }
    }

    pub fn with_options(options: ScopeOptions) -> Self {
        let id = NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            scope = id,
            label = options.label.as_deref().unwrap_or(""),
            "slot scope established"
        );
        Self {
            inner: Rc::new(ScopeInner {
                id,
                options,
                registry: RefCell::new(Registry::new()),
                pending: RefCell::new(Vec::new()),
                owners: RefCell::new(HashMap::new()),
                subscribers: RefCell::new(Vec::new()),
                next_subscriber: Cell::new(0),
                next_writer: Cell::new(0),
                committing: Cell::new(false),
                recommit: Cell::new(false),
                collisions: Cell::new(0),
            }),
        }
    }

    pub fn options(&self) -> &ScopeOptions {
        &self.inner.options
    }

    /// Whether two handles point at the same scope.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -------------------------------------------------------------------------
    // Ambient lookup
    // -------------------------------------------------------------------------

    /// Run `f` with this scope as the innermost active scope for `T`.
    pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        push_scope(Rc::new(self.clone()));
        let _guard = EnterGuard;
        f()
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn has_slot(&self, name: &str) -> bool {
        self.inner.registry.borrow().has(name)
    }

    /// The value registered under `name`, if any.
    pub fn slot_value(&self, name: &str) -> Option<SlotValue<T>> {
        self.inner.registry.borrow().get(name).cloned()
    }

    /// The latest committed snapshot.
    pub fn slot_values(&self) -> Rc<SlotMap<T>> {
        self.inner.registry.borrow().snapshot()
    }

    pub fn slot_names(&self) -> Vec<SlotName> {
        self.inner.registry.borrow().names()
    }

    pub fn version(&self) -> u64 {
        self.inner.registry.borrow().version()
    }

    pub fn len(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.borrow().is_empty()
    }

    /// Decide what the slot `name` renders, given the caller's default.
    ///
    /// - no entry: `default`, verbatim
    /// - transform: `transform(default)`
    /// - content: the content, verbatim (empty included)
    pub fn resolve(&self, name: &str, default: Content<T>) -> Content<T> {
        // Clone out so a transform can read the scope without a live borrow.
        let value = self.inner.registry.borrow().get(name).cloned();
        match value {
            None => {
                tracing::trace!(scope = self.inner.id, slot = name, "slot unset, rendering default");
                default
            }
            Some(value) => {
                tracing::trace!(
                    scope = self.inner.id,
                    slot = name,
                    transform = value.is_transform(),
                    "slot resolved from registry"
                );
                value.resolve(default)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Direct mutation
    // -------------------------------------------------------------------------

    /// Store `value` under `name` immediately.
    ///
    /// A reference-identical value is a no-op. The name is detached from any
    /// writer that registered it, so that writer's teardown leaves it alone.
    pub fn set_slot_value(&self, name: impl AsRef<str>, value: impl Into<SlotValue<T>>) -> Result<()> {
        let name = SlotName::new(name)?;
        self.inner.owners.borrow_mut().remove(&name);
        let replaced = self.inner.registry.borrow_mut().set(name.clone(), value.into());
        if let Some(replaced) = replaced {
            self.publish(replaced.change, vec![name]);
            // Overwritten values drop here, after the registry borrow ended.
            drop(replaced.previous);
        }
        Ok(())
    }

    /// Remove `name` immediately. Absent names are a no-op.
    pub fn remove_slot_value(&self, name: impl AsRef<str>) -> Result<()> {
        let name = SlotName::new(name)?;
        self.inner.owners.borrow_mut().remove(&name);
        let replaced = self.inner.registry.borrow_mut().remove(name.as_str());
        if let Some(replaced) = replaced {
            self.publish(replaced.change, vec![name]);
            drop(replaced.previous);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Commit
    // -------------------------------------------------------------------------

    /// Number of writes waiting for the next commit.
    pub fn pending_writes(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Apply every queued write, then notify subscribers.
    ///
    /// Returns the merged report, or `None` when nothing changed. A commit
    /// requested from inside a subscriber is folded into the running one.
    pub fn commit(&self) -> Option<CommitReport> {
        let inner = &self.inner;
        if inner.committing.get() {
            inner.recommit.set(true);
            return None;
        }
        inner.committing.set(true);
        let _guard = CommitGuard(&inner.committing);

        let mut merged: Option<CommitReport> = None;
        loop {
            inner.recommit.set(false);
            let batch = std::mem::take(&mut *inner.pending.borrow_mut());
            let (report, displaced) = self.apply_batch(batch);
            if let Some(report) = report {
                self.notify(&report);
                match merged.as_mut() {
                    Some(merged) => merged.absorb(report),
                    None => merged = Some(report),
                }
            }
            // Overwritten values may own writers. Their teardown reports
            // follow the batch that displaced them.
            drop(displaced);
            if !inner.recommit.get() && inner.pending.borrow().is_empty() {
                break;
            }
        }
        merged
    }

    /// Apply one batch. Also hands back the snapshots it displaced, which the
    /// caller must drop with no borrow of this scope held.
    fn apply_batch(
        &self,
        batch: Vec<PendingWrite<T>>,
    ) -> (Option<CommitReport>, Vec<Rc<SlotMap<T>>>) {
        if batch.is_empty() {
            return (None, Vec::new());
        }
        let inner = &self.inner;
        let mut changes = SlotChange::NONE;
        let mut names: Vec<SlotName> = Vec::new();
        let mut displaced: Vec<Rc<SlotMap<T>>> = Vec::new();

        {
            let mut registry = inner.registry.borrow_mut();
            let mut owners = inner.owners.borrow_mut();
            for write in batch {
                let taken_over = owners
                    .get(&write.name)
                    .filter(|&&owner| owner != write.writer)
                    .copied();
                if let Some(owner) = taken_over {
                    inner.collisions.set(inner.collisions.get() + 1);
                    if inner.options.warn_on_collision {
                        tracing::warn!(
                            scope = inner.id,
                            label = inner.label(),
                            slot = %write.name,
                            previous_writer = owner,
                            writer = write.writer,
                            "two writers registered the same slot; last commit wins"
                        );
                    }
                }
                owners.insert(write.name.clone(), write.writer);
                if let Some(replaced) = registry.set(write.name.clone(), write.value) {
                    changes |= replaced.change;
                    displaced.push(replaced.previous);
                    if let Err(at) = names.binary_search(&write.name) {
                        names.insert(at, write.name);
                    }
                }
            }
        }

        if names.is_empty() {
            return (None, displaced);
        }
        let version = self.version();
        tracing::debug!(
            scope = inner.id,
            label = inner.label(),
            version,
            changes = ?changes,
            slots = ?names,
            "slot writes committed"
        );
        (Some(CommitReport { version, changes, names }), displaced)
    }

    fn publish(&self, changes: SlotChange, names: Vec<SlotName>) {
        let report = CommitReport {
            version: self.version(),
            changes,
            names,
        };
        tracing::debug!(
            scope = self.inner.id,
            label = self.inner.label(),
            version = report.version,
            changes = ?report.changes,
            slots = ?report.names,
            "slot registry updated"
        );
        self.notify(&report);
    }

    fn notify(&self, report: &CommitReport) {
        // Snapshot the list so callbacks may subscribe or unsubscribe.
        let subscribers: Vec<Subscriber> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in subscribers {
            callback(report);
        }
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Call `callback` after every effective registry change.
    pub fn subscribe(&self, callback: impl Fn(&CommitReport) + 'static) -> Subscription {
        let id = self.inner.next_subscriber.get();
        self.inner.next_subscriber.set(id + 1);
        self.inner
            .subscribers
            .borrow_mut()
            .push((id, Rc::new(callback)));

        let weak = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.subscribers.borrow_mut().retain(|(sid, _)| *sid != id);
                }
            })),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    // -------------------------------------------------------------------------
    // Writer plumbing
    // -------------------------------------------------------------------------

    pub(crate) fn downgrade(&self) -> WeakSlotScope<T> {
        WeakSlotScope(Rc::downgrade(&self.inner))
    }

    pub(crate) fn scope_id(&self) -> u64 {
        self.inner.id
    }

    pub(crate) fn allocate_writer(&self) -> WriterId {
        let id = self.inner.next_writer.get();
        self.inner.next_writer.set(id + 1);
        id
    }

    /// Queue a write for the next commit, replacing the writer's earlier one.
    pub(crate) fn queue_write(&self, writer: WriterId, name: SlotName, value: SlotValue<T>) {
        let replaced = {
            let mut pending = self.inner.pending.borrow_mut();
            let replaced = take_writes_of(&mut pending, writer);
            pending.push(PendingWrite { writer, name, value });
            replaced
        };
        drop(replaced);
    }

    /// Writer-driven takeovers of a name seen so far.
    ///
    /// Counts every commit where a live writer replaced another live
    /// writer's registration, whether in the same pass or a later one.
    pub fn collisions(&self) -> u64 {
        self.inner.collisions.get()
    }

    /// Tear down a writer: drop its queued write and, if it still owns its
    /// committed registration, remove the name.
    pub(crate) fn release_writer(&self, writer: WriterId, name: &SlotName) {
        let cancelled = take_writes_of(&mut self.inner.pending.borrow_mut(), writer);
        drop(cancelled);

        let owned = {
            let mut owners = self.inner.owners.borrow_mut();
            if owners.get(name) == Some(&writer) {
                owners.remove(name);
                true
            } else {
                false
            }
        };
        if !owned {
            return;
        }
        let replaced = self.inner.registry.borrow_mut().remove(name.as_str());
        if let Some(replaced) = replaced {
            self.publish(replaced.change, vec![name.clone()]);
            drop(replaced.previous);
        }
    }
}

/// Split out every queued write of `writer`. The caller drops them once the
/// queue borrow is released.
fn take_writes_of<T>(pending: &mut Vec<PendingWrite<T>>, writer: WriterId) -> Vec<PendingWrite<T>> {
    let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(pending)
        .into_iter()
        .partition(|write| write.writer == writer);
    *pending = kept;
    taken
}

/// Non-owning scope handle held by writers and resolvers.
pub(crate) struct WeakSlotScope<T>(Weak<ScopeInner<T>>);

impl<T: 'static> WeakSlotScope<T> {
    pub(crate) fn upgrade(&self) -> Option<SlotScope<T>> {
        self.0.upgrade().map(|inner| SlotScope { inner })
    }
}

impl<T> Clone for WeakSlotScope<T> {
    fn clone(&self) -> Self {
        Self(Weak::clone(&self.0))
    }
}

// =============================================================================
// Scope Stack
// =============================================================================

thread_local! {
    /// Active scopes, innermost last. Type-erased so scopes of different
    /// content types share one stack.
    static SCOPE_STACK: RefCell<Vec<Rc<dyn Any>>> = const { RefCell::new(Vec::new()) };
}

fn push_scope(scope: Rc<dyn Any>) {
    SCOPE_STACK.with(|stack| stack.borrow_mut().push(scope));
}

fn pop_scope() {
    SCOPE_STACK.with(|stack| {
        stack.borrow_mut().pop();
    });
}

struct EnterGuard;

impl Drop for EnterGuard {
    fn drop(&mut self) {
        pop_scope();
    }
}

/// Innermost active scope for content type `T`, if any.
pub fn current_scope<T: 'static>() -> Option<SlotScope<T>> {
    SCOPE_STACK.with(|stack| {
        stack
            .borrow()
            .iter()
            .rev()
            .find_map(|scope| scope.downcast_ref::<SlotScope<T>>().cloned())
    })
}

/// Depth of the scope stack across all content types.
pub fn scope_depth() -> usize {
    SCOPE_STACK.with(|stack| stack.borrow().len())
}

/// Innermost active scope for `T`, or [`SlotError::NoScope`].
pub fn use_slots<T: 'static>() -> Result<SlotScope<T>> {
    require_scope("use_slots")
}

pub(crate) fn require_scope<T: 'static>(capability: &'static str) -> Result<SlotScope<T>> {
    current_scope().ok_or(SlotError::NoScope { capability })
}

// =============================================================================
// Ambient capabilities
// =============================================================================

/// Whether the ambient scope has an entry for `name`.
pub fn has_slot<T: 'static>(name: &str) -> Result<bool> {
    Ok(require_scope::<T>("has_slot")?.has_slot(name))
}

/// The ambient scope's latest snapshot.
pub fn slot_values<T: 'static>() -> Result<Rc<SlotMap<T>>> {
    Ok(require_scope::<T>("slot_values")?.slot_values())
}

pub fn slot_value<T: 'static>(name: &str) -> Result<Option<SlotValue<T>>> {
    Ok(require_scope::<T>("slot_value")?.slot_value(name))
}

pub fn set_slot_value<T: 'static>(name: &str, value: impl Into<SlotValue<T>>) -> Result<()> {
    require_scope::<T>("set_slot_value")?.set_slot_value(name, value)
}

pub fn remove_slot_value<T: 'static>(name: &str) -> Result<()> {
    require_scope::<T>("remove_slot_value")?.remove_slot_value(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_establish_starts_empty() {
        let scope: SlotScope<String> = SlotScope::establish();
        assert!(scope.is_empty());
        assert_eq!(scope.version(), 0);
        assert!(!scope.has_slot("main"));
        assert!(scope.slot_value("main").is_none());
    }

    #[test]
    fn test_scopes_do_not_share_registries() {
        let a: SlotScope<i32> = SlotScope::establish();
        let b: SlotScope<i32> = SlotScope::establish();
        a.set_slot_value("main", SlotValue::content(1)).unwrap();

        assert!(a.has_slot("main"));
        assert!(!b.has_slot("main"));
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&a.clone()));
    }

    #[test]
    fn test_use_slots_outside_scope_fails() {
        let err = use_slots::<String>().unwrap_err();
        assert_eq!(err, SlotError::NoScope { capability: "use_slots" });
        assert_eq!(
            has_slot::<String>("main"),
            Err(SlotError::NoScope { capability: "has_slot" })
        );
        assert_eq!(
            slot_value::<String>("main").unwrap_err(),
            SlotError::NoScope { capability: "slot_value" }
        );
        assert_eq!(
            slot_values::<String>().unwrap_err(),
            SlotError::NoScope { capability: "slot_values" }
        );
        assert_eq!(
            set_slot_value::<String>("main", SlotValue::empty()),
            Err(SlotError::NoScope { capability: "set_slot_value" })
        );
        assert_eq!(
            remove_slot_value::<String>("main"),
            Err(SlotError::NoScope { capability: "remove_slot_value" })
        );
    }

    #[test]
    fn test_enter_pushes_and_pops() {
        let scope: SlotScope<i32> = SlotScope::establish();
        assert_eq!(scope_depth(), 0);

        scope.enter(|| {
            assert_eq!(scope_depth(), 1);
            let found = use_slots::<i32>().unwrap();
            assert!(found.ptr_eq(&scope));
        });

        assert_eq!(scope_depth(), 0);
        assert!(current_scope::<i32>().is_none());
    }

    #[test]
    fn test_innermost_scope_wins() {
        let outer: SlotScope<i32> = SlotScope::establish();
        let inner: SlotScope<i32> = SlotScope::establish();

        outer.enter(|| {
            inner.enter(|| {
                assert!(use_slots::<i32>().unwrap().ptr_eq(&inner));
            });
            assert!(use_slots::<i32>().unwrap().ptr_eq(&outer));
        });
    }

    #[test]
    fn test_lookup_is_keyed_by_content_type() {
        let numbers: SlotScope<i32> = SlotScope::establish();
        let labels: SlotScope<String> = SlotScope::establish();

        numbers.enter(|| {
            labels.enter(|| {
                assert!(use_slots::<i32>().unwrap().ptr_eq(&numbers));
                assert!(use_slots::<String>().unwrap().ptr_eq(&labels));
                assert!(use_slots::<u8>().is_err());
            });
        });
    }

    #[test]
    fn test_enter_pops_on_unwind() {
        let scope: SlotScope<i32> = SlotScope::establish();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _: () = scope.enter(|| panic!("render failed"));
        }));

        assert!(result.is_err());
        assert_eq!(scope_depth(), 0);
    }

    #[test]
    fn test_ambient_capabilities() {
        let scope: SlotScope<i32> = SlotScope::establish();
        scope.enter(|| {
            set_slot_value::<i32>("main", SlotValue::content(3)).unwrap();
            assert_eq!(has_slot::<i32>("main"), Ok(true));
            assert_eq!(slot_values::<i32>().unwrap().len(), 1);
            assert!(slot_value::<i32>("main").unwrap().is_some());

            remove_slot_value::<i32>("main").unwrap();
            assert_eq!(has_slot::<i32>("main"), Ok(false));
        });
    }

    #[test]
    fn test_set_rejects_empty_name() {
        let scope: SlotScope<i32> = SlotScope::establish();
        assert_eq!(
            scope.set_slot_value("", SlotValue::content(1)),
            Err(SlotError::EmptyName)
        );
    }

    #[test]
    fn test_remove_rejects_empty_name() {
        let scope: SlotScope<i32> = SlotScope::establish();
        assert_eq!(scope.remove_slot_value(""), Err(SlotError::EmptyName));
        assert_eq!(scope.version(), 0);
    }

    #[test]
    fn test_collisions_count_live_takeovers() {
        let scope: SlotScope<i32> = SlotScope::builder().warn_on_collision(false).establish();
        let a = scope.allocate_writer();
        let b = scope.allocate_writer();
        let name = SlotName::new("main").unwrap();

        // Same pass.
        scope.queue_write(a, name.clone(), SlotValue::content(1));
        scope.queue_write(b, name.clone(), SlotValue::content(2));
        scope.commit();
        assert_eq!(scope.collisions(), 1);

        // A later pass taking the name back.
        scope.queue_write(a, name.clone(), SlotValue::content(3));
        scope.commit();
        assert_eq!(scope.collisions(), 2);

        // The owner rewriting its own name is not a collision.
        scope.queue_write(a, name.clone(), SlotValue::content(4));
        scope.commit();
        assert_eq!(scope.collisions(), 2);

        // Neither is writing after the owner released the name.
        scope.release_writer(a, &name);
        scope.queue_write(b, name.clone(), SlotValue::content(5));
        scope.commit();
        assert_eq!(scope.collisions(), 2);

        // Direct writes detach ownership without counting.
        scope.set_slot_value("main", SlotValue::content(6)).unwrap();
        scope.queue_write(a, name, SlotValue::content(7));
        scope.commit();
        assert_eq!(scope.collisions(), 2);
    }

    #[test]
    fn test_direct_set_notifies_only_on_change() {
        let scope: SlotScope<i32> = SlotScope::establish();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let _sub = scope.subscribe(move |report| seen_clone.borrow_mut().push(report.clone()));

        let value = SlotValue::content(1);
        scope.set_slot_value("main", value.clone()).unwrap();
        scope.set_slot_value("main", value).unwrap();
        scope.remove_slot_value("missing").unwrap();
        scope.remove_slot_value("main").unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].changes, SlotChange::ADDED);
        assert_eq!(seen[1].changes, SlotChange::REMOVED);
        assert_eq!(seen[1].version, 2);
        assert!(seen[1].touches("main"));
    }

    #[test]
    fn test_subscription_drop_unsubscribes() {
        let scope: SlotScope<i32> = SlotScope::establish();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = hits.clone();

        let sub = scope.subscribe(move |_| hits_clone.set(hits_clone.get() + 1));
        assert_eq!(scope.subscriber_count(), 1);
        scope.set_slot_value("a", SlotValue::content(1)).unwrap();

        drop(sub);
        assert_eq!(scope.subscriber_count(), 0);
        scope.set_slot_value("b", SlotValue::content(2)).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_commit_applies_queue_in_order() {
        let scope: SlotScope<i32> = SlotScope::builder().warn_on_collision(false).establish();
        let a = scope.allocate_writer();
        let b = scope.allocate_writer();
        let name = SlotName::new("main").unwrap();

        scope.queue_write(a, name.clone(), SlotValue::content(1));
        scope.queue_write(b, name.clone(), SlotValue::content(2));
        assert_eq!(scope.pending_writes(), 2);
        assert!(!scope.has_slot("main"));

        let report = scope.commit().unwrap();
        assert_eq!(report.names, vec![name]);
        assert_eq!(report.changes, SlotChange::ADDED | SlotChange::UPDATED);
        assert_eq!(scope.pending_writes(), 0);
        assert_eq!(
            scope.resolve("main", Content::empty()).get(),
            Some(&2)
        );
    }

    #[test]
    fn test_commit_with_nothing_queued() {
        let scope: SlotScope<i32> = SlotScope::establish();
        assert!(scope.commit().is_none());
    }

    #[test]
    fn test_reentrant_commit_is_folded() {
        let scope: SlotScope<i32> = SlotScope::establish();
        let writer = scope.allocate_writer();
        let follow_up = scope.allocate_writer();
        let weak = scope.downgrade();
        let calls = Rc::new(Cell::new(0));
        let calls_clone = calls.clone();

        let _sub = scope.subscribe(move |report| {
            calls_clone.set(calls_clone.get() + 1);
            if report.touches("first") {
                if let Some(scope) = weak.upgrade() {
                    scope.queue_write(
                        follow_up,
                        SlotName::new("second").unwrap(),
                        SlotValue::content(2),
                    );
                    assert!(scope.commit().is_none());
                }
            }
        });

        scope.queue_write(writer, SlotName::new("first").unwrap(), SlotValue::content(1));
        let report = scope.commit().unwrap();

        assert_eq!(calls.get(), 2);
        assert!(report.touches("first"));
        assert!(report.touches("second"));
        assert!(scope.has_slot("second"));
    }

    #[test]
    fn test_release_only_removes_owned_registration() {
        let scope: SlotScope<i32> = SlotScope::builder().warn_on_collision(false).establish();
        let a = scope.allocate_writer();
        let b = scope.allocate_writer();
        let name = SlotName::new("main").unwrap();

        scope.queue_write(a, name.clone(), SlotValue::content(1));
        scope.commit();
        scope.queue_write(b, name.clone(), SlotValue::content(2));
        scope.commit();

        scope.release_writer(a, &name);
        assert!(scope.has_slot("main"));

        scope.release_writer(b, &name);
        assert!(!scope.has_slot("main"));
    }

    #[test]
    fn test_release_cancels_pending_write() {
        let scope: SlotScope<i32> = SlotScope::establish();
        let a = scope.allocate_writer();
        let name = SlotName::new("main").unwrap();

        scope.queue_write(a, name.clone(), SlotValue::content(1));
        scope.release_writer(a, &name);

        assert!(scope.commit().is_none());
        assert!(!scope.has_slot("main"));
    }

    #[test]
    fn test_direct_set_detaches_writer_ownership() {
        let scope: SlotScope<i32> = SlotScope::establish();
        let a = scope.allocate_writer();
        let name = SlotName::new("main").unwrap();

        scope.queue_write(a, name.clone(), SlotValue::content(1));
        scope.commit();
        scope.set_slot_value("main", SlotValue::content(9)).unwrap();
        scope.release_writer(a, &name);

        assert_eq!(scope.resolve("main", Content::empty()).get(), Some(&9));
    }

    #[test]
    fn test_weak_handle_dies_with_scope() {
        let scope: SlotScope<i32> = SlotScope::builder().label("sidebar").establish();
        assert_eq!(scope.options().label.as_deref(), Some("sidebar"));

        let weak = scope.downgrade();
        assert!(weak.upgrade().is_some());
        drop(scope);
        assert!(weak.upgrade().is_none());
    }
}
