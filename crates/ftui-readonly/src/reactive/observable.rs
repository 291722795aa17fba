#![forbid(unsafe_code)]

//! Observable value wrapper with change notification and version tracking.
//!
//! # Design
//!
//! [`Observable<T>`] wraps a value of type `T` in shared, reference-counted
//! storage. It exposes both notification capabilities a proxy can forward:
//!
//! - [`WillChange`]: a bare `()` sent *before* each value-changing mutation.
//! - [`PropertyChanges`]: a [`ValueChange`] sent *after* each value-changing
//!   mutation, carrying the new version and both values.
//!
//! # Performance
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `get()`       | O(1) + clone               |
//! | `set()`       | O(S) where S = subscribers |
//! | `subscribe()` | O(1) amortized             |
//!
//! # Failure Modes
//!
//! - **Re-entrant read in `update`**: the closure passed to `update()` works
//!   on a detached copy, so reading the observable from inside it sees the
//!   old value.
//! - **Mutation from a will-change callback**: allowed, but the outer
//!   mutation is applied afterwards and wins.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::publisher::{Publisher, Subscription};
use super::source::{PropertyChanges, WillChange};
use crate::proxy::ReadOnly;

/// Fine-grained change event emitted by [`Observable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueChange<T> {
    /// Version after the change.
    pub version: u64,
    /// Value before the change.
    pub old: T,
    /// Value after the change.
    pub new: T,
}

struct ObservableInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    will_change: Publisher<()>,
    changes: Publisher<ValueChange<T>>,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `Observable` creates a new handle to the **same** inner state:
/// both handles see the same value and share subscribers.
///
/// # Invariants
///
/// 1. `version` increments by exactly 1 on each value-changing mutation.
/// 2. `set(v)` where `v == current` is a no-op: no version bump, no signals.
/// 3. For each value-changing mutation, exactly one will-change signal is
///    sent before the value is replaced and exactly one [`ValueChange`] after.
pub struct Observable<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("subscriber_count", &self.inner.changes.subscriber_count())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a new observable with the given initial value.
    ///
    /// The initial version is 0 and no subscribers are registered.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(ObservableInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                will_change: Publisher::new(),
                changes: Publisher::new(),
            }),
        }
    }

    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Set a new value. If it differs from the current value (by
    /// `PartialEq`), will-change fires, the value is replaced, the version
    /// is incremented, and a [`ValueChange`] is sent.
    pub fn set(&self, value: T) {
        if *self.inner.value.borrow() == value {
            return;
        }

        self.inner.will_change.send(&());

        let old = self.inner.value.replace(value);
        let version = self.inner.version.get() + 1;
        self.inner.version.set(version);

        let change = ValueChange {
            version,
            old,
            new: self.get(),
        };
        self.inner.changes.send(&change);
    }

    /// Modify a copy of the value via a closure, then [`set`](Self::set) it.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Subscribe to value changes. The callback receives the new value.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner
            .changes
            .subscribe(move |change: &ValueChange<T>| callback(&change.new))
    }

    /// Current version number.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Number of fine-grained subscribers (including dead ones not yet
    /// pruned).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.changes.subscriber_count()
    }

    /// Read-only facet sharing this observable's state and channels.
    #[must_use]
    pub fn view(&self) -> ObservableView<T> {
        ObservableView {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Wrap a [`view()`](Self::view) of this observable in a [`ReadOnly`]
    /// proxy.
    ///
    /// The proxy starts inert; enable propagation on it explicitly. Readers
    /// get `&ObservableView<T>`, which has no setters:
    ///
    /// ```compile_fail
    /// use ftui_readonly::Observable;
    ///
    /// let counter = Observable::new(0u32);
    /// let view = counter.read_only();
    /// view.read(|c| c.set(1));
    /// ```
    ///
    /// ```compile_fail
    /// use ftui_readonly::Observable;
    ///
    /// let counter = Observable::new(0u32);
    /// let view = counter.read_only();
    /// let escaped: Observable<u32> = view.read(Clone::clone);
    /// ```
    #[must_use]
    pub fn read_only(&self) -> ReadOnly<ObservableView<T>> {
        ReadOnly::new(self.view())
    }
}

/// Read-only facet of an [`Observable`].
///
/// Shares the observable's value, version, and both change channels, but
/// exposes no way to mutate the value. Cloning yields another view, never an
/// [`Observable`].
pub struct ObservableView<T> {
    inner: Rc<ObservableInner<T>>,
}

impl<T> Clone for ObservableView<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ObservableView<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservableView")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

impl<T: Clone> ObservableView<T> {
    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Current version number of the underlying observable.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }
}

impl<T: Clone + PartialEq + 'static> PropertyChanges for ObservableView<T> {
    type Change = ValueChange<T>;

    fn property_changes(&self) -> Publisher<Self::Change> {
        self.inner.changes.clone()
    }
}

impl<T> WillChange for ObservableView<T> {
    type Signal = ();

    fn will_change(&self) -> Publisher<Self::Signal> {
        self.inner.will_change.clone()
    }
}

impl<T: Clone + PartialEq + 'static> PropertyChanges for Observable<T> {
    type Change = ValueChange<T>;

    fn property_changes(&self) -> Publisher<Self::Change> {
        self.inner.changes.clone()
    }
}

impl<T> WillChange for Observable<T> {
    type Signal = ();

    fn will_change(&self) -> Publisher<Self::Signal> {
        self.inner.will_change.clone()
    }
}
