//! # slotline
//!
//! Single-threaded signals and slots with safe reentrancy.
//!
//! A [`Signal`] is a registry of callbacks ("slots") invoked together by
//! [`Signal::emit`]. Connecting returns a [`Connection`] handle that can
//! disconnect the slot later, even from inside the slot, and that stays safe
//! to query after the signal is gone. [`ScopedConnection`] disconnects
//! automatically when dropped.
//!
//! Slots may connect, disconnect, clear or re-emit the signal while it is
//! being emitted. Disconnected slots are tombstoned and removed in one sweep
//! when the outermost emission returns, so emitting stays a forward walk over
//! one contiguous vector.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use slotline::Signal;
//!
//! let signal = Signal::<&'static str>::new();
//! let log = Rc::new(RefCell::new(Vec::new()));
//!
//! let log_a = log.clone();
//! let _a = signal.connect(move |msg| log_a.borrow_mut().push(format!("a:{msg}")));
//! let log_b = log.clone();
//! signal.connect_once(move |msg| log_b.borrow_mut().push(format!("b:{msg}")));
//!
//! signal.emit("one");
//! signal.emit("two");
//!
//! assert_eq!(*log.borrow(), ["a:one", "b:one", "a:two"]);
//! ```

mod connection;
mod error;
mod scoped;
mod signal;
mod slot;
mod slot_id;
mod store;

pub use crate::connection::Connection;
pub use crate::error::SignalError;
pub use crate::scoped::ScopedConnection;
pub use crate::signal::Signal;
pub use crate::slot_id::SlotId;
