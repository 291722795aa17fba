#![forbid(unsafe_code)]

//! Multicast notification channel with weakly-held subscribers.
//!
//! # Design
//!
//! [`Publisher<E>`] is a shared, reference-counted list of subscriber
//! callbacks. Each callback is owned strongly by the [`Subscription`] guard
//! returned from [`subscribe()`](Publisher::subscribe) and only weakly by the
//! publisher, so the publisher never keeps a subscriber alive.
//!
//! # Performance
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `send()`      | O(S) where S = subscribers |
//! | `subscribe()` | O(1) amortized             |
//! | `downgrade()` | O(1)                       |
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: Guards stored indefinitely keep their callbacks
//!   registered. Dead weak references are pruned lazily during `send()` and
//!   `subscribe()`, so churn on a silent channel stays bounded.
//! - **Re-entrant send**: Sending on a publisher from inside one of its own
//!   callbacks is allowed. Callbacks are collected before any of them runs,
//!   so a subscriber added during delivery first sees the next event.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

type CallbackRc<E> = Rc<dyn Fn(&E)>;
type CallbackWeak<E> = Weak<dyn Fn(&E)>;

struct PublisherInner<E> {
    /// Dead entries are pruned on send and subscribe.
    subscribers: RefCell<Vec<CallbackWeak<E>>>,
    sent: Cell<u64>,
}

/// A multicast event channel.
///
/// Cloning a `Publisher` creates a new handle to the **same** channel: both
/// handles share subscribers and the send counter.
///
/// # Invariants
///
/// 1. Subscribers are invoked in registration order.
/// 2. Each live subscriber receives each sent event exactly once.
/// 3. A callback whose [`Subscription`] was dropped is never invoked again.
/// 4. `sent()` increments by exactly 1 per `send()`.
pub struct Publisher<E> {
    inner: Rc<PublisherInner<E>>,
}

impl<E> Clone for Publisher<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for Publisher<E> {
    fn default() -> Self {
        Self {
            inner: Rc::new(PublisherInner {
                subscribers: RefCell::new(Vec::new()),
                sent: Cell::new(0),
            }),
        }
    }
}

impl<E> std::fmt::Debug for Publisher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("subscriber_count", &self.inner.subscribers.borrow().len())
            .field("sent", &self.inner.sent.get())
            .finish()
    }
}

impl<E: 'static> Publisher<E> {
    /// Create a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked with every subsequently sent event.
    ///
    /// Dropping the returned guard unsubscribes the callback. The stale
    /// entry stays in the list until the next `send()` or `subscribe()`
    /// prunes it.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let strong: CallbackRc<E> = Rc::new(callback);
        let mut subscribers = self.inner.subscribers.borrow_mut();
        subscribers.retain(|w| w.strong_count() > 0);
        subscribers.push(Rc::downgrade(&strong));
        drop(subscribers);
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Deliver `event` to every live subscriber and prune dead ones.
    pub fn send(&self, event: &E) {
        let callbacks: Vec<CallbackRc<E>> = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        self.inner.sent.set(self.inner.sent.get() + 1);

        for cb in &callbacks {
            cb(event);
        }
    }
}

impl<E> Publisher<E> {
    /// Number of registered callbacks, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Total number of `send()` calls on this channel.
    #[must_use]
    pub fn sent(&self) -> u64 {
        self.inner.sent.get()
    }

    /// Create a non-owning handle to this channel.
    #[must_use]
    pub fn downgrade(&self) -> WeakPublisher<E> {
        WeakPublisher {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same channel.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Non-owning handle to a [`Publisher`].
///
/// Capture this in callbacks registered on another publisher to forward
/// events without creating a reference cycle.
pub struct WeakPublisher<E> {
    inner: Weak<PublisherInner<E>>,
}

impl<E> Clone for WeakPublisher<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<E> std::fmt::Debug for WeakPublisher<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakPublisher")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<E> WeakPublisher<E> {
    /// Recover a strong handle if the channel is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<Publisher<E>> {
        self.inner.upgrade().map(|inner| Publisher { inner })
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the `Subscription` drops the only strong reference to the
/// callback, so the publisher's weak entry fails to upgrade from then on.
#[must_use = "dropping a Subscription immediately unsubscribes the callback"]
pub struct Subscription {
    /// Type-erased `Rc<dyn Fn(&E)>`.
    _guard: Box<dyn Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_reaches_subscriber() {
        let publisher = Publisher::<u32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);

        let _sub = publisher.subscribe(move |v| seen_clone.borrow_mut().push(*v));

        publisher.send(&1);
        publisher.send(&2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(publisher.sent(), 2);
    }

    #[test]
    fn send_without_subscribers_still_counts() {
        let publisher = Publisher::<()>::new();
        publisher.send(&());
        assert_eq!(publisher.sent(), 1);
        assert_eq!(publisher.subscriber_count(), 0);
    }

    #[test]
    fn dropped_subscription_is_not_called() {
        let publisher = Publisher::<u32>::new();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);

        let sub = publisher.subscribe(move |_| count_clone.set(count_clone.get() + 1));
        publisher.send(&1);
        drop(sub);
        publisher.send(&2);

        assert_eq!(count.get(), 1);
    }

    #[test]
    fn dead_subscribers_pruned_on_send() {
        let publisher = Publisher::<u8>::new();
        let _a = publisher.subscribe(|_| {});
        let b = publisher.subscribe(|_| {});
        assert_eq!(publisher.subscriber_count(), 2);

        drop(b);
        assert_eq!(publisher.subscriber_count(), 2);

        publisher.send(&0);
        assert_eq!(publisher.subscriber_count(), 1);
    }

    #[test]
    fn registration_order() {
        let publisher = Publisher::<()>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let log1 = Rc::clone(&log);
        let _s1 = publisher.subscribe(move |_| log1.borrow_mut().push('A'));
        let log2 = Rc::clone(&log);
        let _s2 = publisher.subscribe(move |_| log2.borrow_mut().push('B'));
        let log3 = Rc::clone(&log);
        let _s3 = publisher.subscribe(move |_| log3.borrow_mut().push('C'));

        publisher.send(&());
        assert_eq!(*log.borrow(), vec!['A', 'B', 'C']);
    }

    #[test]
    fn clone_shares_channel() {
        let a = Publisher::<i32>::new();
        let b = a.clone();
        let last = Rc::new(Cell::new(0));
        let last_clone = Rc::clone(&last);

        let _sub = a.subscribe(move |v| last_clone.set(*v));
        b.send(&7);

        assert_eq!(last.get(), 7);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Publisher::new()));
    }

    #[test]
    fn weak_handle_does_not_keep_channel_alive() {
        let publisher = Publisher::<u8>::new();
        let weak = publisher.downgrade();
        assert!(weak.upgrade().is_some());

        drop(publisher);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn subscribe_during_send_sees_next_event() {
        let publisher = Publisher::<u32>::new();
        let late = Rc::new(Cell::new(0u32));
        let late_subs: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let handle = publisher.clone();
        let late_clone = Rc::clone(&late);
        let subs_clone = Rc::clone(&late_subs);
        let _sub = publisher.subscribe(move |_| {
            if subs_clone.borrow().is_empty() {
                let counter = Rc::clone(&late_clone);
                let sub = handle.subscribe(move |_| counter.set(counter.get() + 1));
                subs_clone.borrow_mut().push(sub);
            }
        });

        publisher.send(&1);
        assert_eq!(late.get(), 0);

        publisher.send(&2);
        assert_eq!(late.get(), 1);
    }

    #[test]
    fn subscribe_churn_on_silent_channel_stays_bounded() {
        let publisher = Publisher::<u8>::new();
        let _keep = publisher.subscribe(|_| {});
        for _ in 0..100 {
            let sub = publisher.subscribe(|_| {});
            drop(sub);
        }
        assert_eq!(publisher.sent(), 0);
        assert!(publisher.subscriber_count() <= 2);
    }

    #[test]
    fn counters_work_for_borrowed_event_types() {
        fn channel_for<'a>(_anchor: &'a str) -> Publisher<&'a str> {
            Publisher::default()
        }
        let local = String::from("scoped");
        let publisher = channel_for(&local);
        let other = publisher.clone();
        assert_eq!(publisher.subscriber_count(), 0);
        assert_eq!(publisher.sent(), 0);
        assert!(publisher.ptr_eq(&other));
        assert!(publisher.downgrade().upgrade().is_some());
    }

    #[test]
    fn debug_format() {
        let publisher = Publisher::<u8>::new();
        let _sub = publisher.subscribe(|_| {});
        let dbg = format!("{publisher:?}");
        assert!(dbg.contains("Publisher"));
        assert!(dbg.contains("subscriber_count: 1"));
        assert!(format!("{:?}", publisher.downgrade()).contains("alive: true"));
    }
}
