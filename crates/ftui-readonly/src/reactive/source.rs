#![forbid(unsafe_code)]

//! Change-notification capabilities a wrapped value can expose.
//!
//! A type opts into proxy propagation by implementing one or both traits.
//! Propagation on a type without the capability does not compile.

use super::publisher::Publisher;

/// Fine-grained change stream: one event per individual mutation, carrying
/// data that identifies the change.
pub trait PropertyChanges {
    /// Event describing a single change. Proxies forward it verbatim.
    type Change: Clone + 'static;

    /// Handle to the channel the value emits its change events on.
    fn property_changes(&self) -> Publisher<Self::Change>;
}

/// Coarse will-change signal, emitted before any mutation.
pub trait WillChange {
    /// Payload of the signal. Proxies drop it and re-emit `()`.
    type Signal: 'static;

    /// Handle to the channel the value signals on before it mutates.
    fn will_change(&self) -> Publisher<Self::Signal>;
}

impl<T: PropertyChanges> PropertyChanges for std::rc::Rc<T> {
    type Change = T::Change;

    fn property_changes(&self) -> Publisher<Self::Change> {
        (**self).property_changes()
    }
}

impl<T: WillChange> WillChange for std::rc::Rc<T> {
    type Signal = T::Signal;

    fn will_change(&self) -> Publisher<Self::Signal> {
        (**self).will_change()
    }
}
