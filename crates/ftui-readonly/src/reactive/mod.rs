#![forbid(unsafe_code)]

//! Reactive primitives the read-only proxy forwards between.
//!
//! - [`Publisher`]: a multicast event channel with weakly-held subscribers.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Observable`]: a shared, version-tracked value exposing both change
//!   capabilities.
//! - [`ObservableView`]: the setter-free facet of an [`Observable`] that
//!   read-only proxies wrap.
//! - [`PropertyChanges`] / [`WillChange`]: the capabilities a wrapped value
//!   implements to make its notifications forwardable.
//!
//! # Architecture
//!
//! Everything here is single-threaded (`Rc` + `RefCell`/`Cell`). Channels
//! hold callbacks as `Weak` function pointers and prune dead entries lazily
//! during delivery.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Dropping a [`Subscription`] removes the callback before the next
//!    delivery.
//! 3. An [`Observable`] signals will-change before, and sends its
//!    [`ValueChange`] after, each value-changing mutation.

pub mod observable;
pub mod publisher;
pub mod source;

pub use observable::{Observable, ObservableView, ValueChange};
pub use publisher::{Publisher, Subscription, WeakPublisher};
pub use source::{PropertyChanges, WillChange};
