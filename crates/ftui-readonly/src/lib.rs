#![forbid(unsafe_code)]

//! Read-only observable proxies.
//!
//! [`ReadOnly<T>`] lets UI-observing code depend on an immutable view of
//! mutable state without losing reactivity: reads go through a field
//! selector, and the wrapped value's change notifications can be
//! re-broadcast on the proxy's own channels once explicitly enabled.
//!
//! ```
//! use ftui_readonly::{Observable, ObservableView, ReadOnly};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let counter = Observable::new(0u32);
//! let mut view: ReadOnly<ObservableView<u32>> = counter.read_only();
//! view.enable_coarse_propagation();
//!
//! let redraws = Rc::new(Cell::new(0));
//! let redraws_clone = Rc::clone(&redraws);
//! let _sub = view.will_change().subscribe(move |_| redraws_clone.set(redraws_clone.get() + 1));
//!
//! counter.set(1);
//! assert_eq!(view.read(|c| c.get()), 1);
//! assert_eq!(redraws.get(), 1);
//! ```

pub mod config;
pub mod logging;
pub mod proxy;
pub mod reactive;

pub use config::{ParseModeError, PropagationMode, ProxyConfig};
pub use proxy::ReadOnly;
pub use reactive::{
    Observable, ObservableView, PropertyChanges, Publisher, Subscription, ValueChange,
    WeakPublisher, WillChange,
};
