#![forbid(unsafe_code)]

//! Read-only proxy over a wrapped value with opt-in change forwarding.
//!
//! # Design
//!
//! [`ReadOnly<T>`] owns exactly one `T` and only ever hands out shared
//! references to it, through a field-selector closure passed to
//! [`read()`](ReadOnly::read). It exposes two outgoing channels:
//!
//! - `property_changes()`: fine-grained events, re-emitted verbatim.
//! - `will_change()`: coarse `()` signals, payload dropped.
//!
//! Nothing is forwarded until one of the `enable_*` methods is called.
//!
//! # Ownership
//!
//! ```text
//!   wrapped value ──Weak──▶ forwarding callback ──Weak──▶ outgoing channel
//!        ▲                         ▲                            ▲
//!        └──── owned ──── ReadOnly ┴── owns Subscription ───────┘ owns
//! ```
//!
//! The wrapped value's channel holds the forwarding callback weakly, the
//! callback holds the proxy's outgoing channel weakly, and the proxy owns
//! the [`Subscription`] guard. Dropping the proxy drops the guard, which
//! ends forwarding and leaves no cycle between the two sides.
//!
//! # Invariants
//!
//! 1. `read(f)` returns `f(&value)` and has no side effects.
//! 2. At most one forwarding subscription exists per channel.
//! 3. Each source event yields exactly one outgoing event while enabled.
//! 4. No outgoing event is emitted while a channel is not enabled.

use std::any::Any;
use std::cell::OnceCell;

use crate::config::{PropagationMode, ProxyConfig};
use crate::logging::TARGET;
use crate::reactive::{PropertyChanges, Publisher, Subscription, WillChange};

/// Read-only view of a `T` that can re-broadcast `T`'s change notifications.
///
/// Construct with [`ReadOnly::new`] or `ReadOnly::from(value)`. There is no
/// way to obtain `&mut T` or to move the value back out. Wrap a
/// [`Observable::view`](crate::Observable::view) (or use
/// [`Observable::read_only`](crate::Observable::read_only)) rather than the
/// observable itself, so the selector never sees a setter.
///
/// The wrapped value is private:
///
/// ```compile_fail
/// use ftui_readonly::ReadOnly;
///
/// let proxy = ReadOnly::new(vec![1, 2, 3]);
/// let _ = &proxy.value;
/// ```
///
/// Selectors only receive a shared reference:
///
/// ```compile_fail
/// use ftui_readonly::ReadOnly;
///
/// let proxy = ReadOnly::new(vec![1, 2, 3]);
/// proxy.read(|v| v.push(4));
/// ```
///
/// There is no mutable accessor, and the value cannot be moved back out:
///
/// ```compile_fail
/// use ftui_readonly::ReadOnly;
///
/// let mut proxy = ReadOnly::new(vec![1, 2, 3]);
/// let _: &mut Vec<i32> = proxy.get_mut();
/// ```
///
/// ```compile_fail
/// use ftui_readonly::ReadOnly;
///
/// let proxy = ReadOnly::new(vec![1, 2, 3]);
/// let _: Vec<i32> = proxy.into_inner();
/// ```
pub struct ReadOnly<T> {
    value: T,
    /// Holds a `Publisher<<T as PropertyChanges>::Change>` once created.
    changes_out: OnceCell<Box<dyn Any>>,
    will_change_out: Publisher<()>,
    fine_grained: Option<Subscription>,
    coarse: Option<Subscription>,
}

impl<T> ReadOnly<T> {
    /// Wrap `value`. The proxy starts with propagation off.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            value,
            changes_out: OnceCell::new(),
            will_change_out: Publisher::default(),
            fine_grained: None,
            coarse: None,
        }
    }

    /// Read through the proxy: returns whatever `selector` extracts from the
    /// wrapped value.
    ///
    /// ```
    /// use ftui_readonly::ReadOnly;
    ///
    /// struct Point { x: i32, y: i32 }
    ///
    /// let p = ReadOnly::new(Point { x: 3, y: 4 });
    /// assert_eq!(p.read(|p| p.x), 3);
    /// assert_eq!(p.read(|p| p.x * p.x + p.y * p.y), 25);
    /// ```
    pub fn read<V>(&self, selector: impl FnOnce(&T) -> V) -> V {
        selector(&self.value)
    }

    /// Outgoing coarse channel. Signals carry no payload.
    #[must_use]
    pub fn will_change(&self) -> Publisher<()> {
        self.will_change_out.clone()
    }

    /// Which channels are currently forwarded.
    #[must_use]
    pub fn propagation(&self) -> PropagationMode {
        match (self.fine_grained.is_some(), self.coarse.is_some()) {
            (false, false) => PropagationMode::Off,
            (true, false) => PropagationMode::FineGrained,
            (false, true) => PropagationMode::Coarse,
            (true, true) => PropagationMode::Both,
        }
    }
}

impl<T: PropertyChanges> ReadOnly<T> {
    /// Outgoing fine-grained channel. Events are the wrapped value's own
    /// change events, unchanged.
    #[must_use]
    pub fn property_changes(&self) -> Publisher<T::Change> {
        self.outgoing_changes()
    }

    /// Start re-emitting every change event of the wrapped value on
    /// [`property_changes()`](Self::property_changes).
    ///
    /// Returns `false` without subscribing again if already enabled.
    pub fn enable_fine_grained_propagation(&mut self) -> bool {
        if self.fine_grained.is_some() {
            tracing::debug!(target: TARGET, mode = %PropagationMode::FineGrained, "propagation already enabled");
            return false;
        }

        let out = self.outgoing_changes().downgrade();
        let sub = self
            .value
            .property_changes()
            .subscribe(move |change: &T::Change| {
                if let Some(out) = out.upgrade() {
                    tracing::trace!(target: TARGET, "forwarding property change");
                    out.send(change);
                }
            });
        self.fine_grained = Some(sub);

        tracing::debug!(target: TARGET, mode = %PropagationMode::FineGrained, "propagation enabled");
        true
    }

    /// Release the fine-grained forwarding subscription.
    ///
    /// Returns `false` if it was not enabled.
    pub fn disable_fine_grained_propagation(&mut self) -> bool {
        let released = self.fine_grained.take().is_some();
        if released {
            tracing::debug!(target: TARGET, mode = %PropagationMode::FineGrained, "propagation disabled");
        }
        released
    }

    fn outgoing_changes(&self) -> Publisher<T::Change> {
        // The slot is only ever filled here, with this exact type.
        let erased = self
            .changes_out
            .get_or_init(|| Box::new(Publisher::<T::Change>::new()) as Box<dyn Any>);
        match erased.downcast_ref::<Publisher<T::Change>>() {
            Some(out) => out.clone(),
            None => {
                debug_assert!(false, "outgoing change channel holds a foreign type");
                tracing::error!(target: TARGET, "outgoing change channel holds a foreign type; forwarding is detached");
                Publisher::default()
            }
        }
    }
}

impl<T: WillChange> ReadOnly<T> {
    /// Start re-emitting every will-change signal of the wrapped value on
    /// [`will_change()`](Self::will_change), as a bare `()`.
    ///
    /// Returns `false` without subscribing again if already enabled.
    pub fn enable_coarse_propagation(&mut self) -> bool {
        if self.coarse.is_some() {
            tracing::debug!(target: TARGET, mode = %PropagationMode::Coarse, "propagation already enabled");
            return false;
        }

        let out = self.will_change_out.downgrade();
        let sub = self.value.will_change().subscribe(move |_: &T::Signal| {
            if let Some(out) = out.upgrade() {
                tracing::trace!(target: TARGET, "forwarding will-change");
                out.send(&());
            }
        });
        self.coarse = Some(sub);

        tracing::debug!(target: TARGET, mode = %PropagationMode::Coarse, "propagation enabled");
        true
    }

    /// Release the coarse forwarding subscription.
    ///
    /// Returns `false` if it was not enabled.
    pub fn disable_coarse_propagation(&mut self) -> bool {
        let released = self.coarse.take().is_some();
        if released {
            tracing::debug!(target: TARGET, mode = %PropagationMode::Coarse, "propagation disabled");
        }
        released
    }
}

impl<T: PropertyChanges + WillChange> ReadOnly<T> {
    /// Wrap `value` and enable the channels named by `config`.
    #[must_use]
    pub fn with_config(value: T, config: &ProxyConfig) -> Self {
        let mut proxy = Self::new(value);
        if config.propagation.fine_grained() {
            proxy.enable_fine_grained_propagation();
        }
        if config.propagation.coarse() {
            proxy.enable_coarse_propagation();
        }
        proxy
    }
}

impl<T: PropertyChanges> ReadOnly<T> {
    /// [`with_config`](Self::with_config) for values with only a
    /// fine-grained stream. A requested coarse channel is skipped with a
    /// warning.
    #[must_use]
    pub fn with_fine_grained_config(value: T, config: &ProxyConfig) -> Self {
        let mut proxy = Self::new(value);
        if config.propagation.fine_grained() {
            proxy.enable_fine_grained_propagation();
        }
        if config.propagation.coarse() {
            tracing::warn!(target: TARGET, mode = %config.propagation, "coarse propagation unsupported by wrapped value");
        }
        proxy
    }
}

impl<T: WillChange> ReadOnly<T> {
    /// [`with_config`](Self::with_config) for values with only a
    /// will-change signal. A requested fine-grained channel is skipped with a
    /// warning.
    #[must_use]
    pub fn with_coarse_config(value: T, config: &ProxyConfig) -> Self {
        let mut proxy = Self::new(value);
        if config.propagation.coarse() {
            proxy.enable_coarse_propagation();
        }
        if config.propagation.fine_grained() {
            tracing::warn!(target: TARGET, mode = %config.propagation, "fine-grained propagation unsupported by wrapped value");
        }
        proxy
    }
}

impl<T> From<T> for ReadOnly<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: PropertyChanges> PropertyChanges for ReadOnly<T> {
    type Change = T::Change;

    fn property_changes(&self) -> Publisher<Self::Change> {
        self.outgoing_changes()
    }
}

impl<T> WillChange for ReadOnly<T> {
    type Signal = ();

    fn will_change(&self) -> Publisher<Self::Signal> {
        self.will_change_out.clone()
    }
}

impl<T> Drop for ReadOnly<T> {
    fn drop(&mut self) {
        if self.fine_grained.is_some() || self.coarse.is_some() {
            tracing::trace!(target: TARGET, mode = %self.propagation(), "releasing forwarding subscriptions");
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ReadOnly<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOnly")
            .field("value", &self.value)
            .field("propagation", &self.propagation())
            .finish()
    }
}
