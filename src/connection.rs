//! Defines [`Connection`], the lightweight handle addressing one connected slot.
//!
//! A `Connection` does not own its slot and does not keep the signal alive. It
//! holds a weak reference to the signal's shared control cell plus the slot id,
//! so every clone of a handle observes the same record, and a handle that
//! outlives its signal simply reports "not connected".

use crate::scoped::ScopedConnection;
use crate::slot_id::SlotId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Weak;

/// The operations a handle may perform on the store it points into.
pub(crate) trait Control {
    fn connected(&self, id: SlotId) -> bool;
    fn disconnect(&self, id: SlotId);
}

/// Sized stand-in that lets `Weak::new` produce an empty `Weak<dyn Control>`.
///
/// Such a `Weak` never upgrades, so these methods never run.
struct Detached;

impl Control for Detached {
    fn connected(&self, _: SlotId) -> bool {
        unreachable!("a detached handle never upgrades")
    }

    fn disconnect(&self, _: SlotId) {
        unreachable!("a detached handle never upgrades")
    }
}

/// Handle to one slot of a [`Signal`](crate::Signal).
///
/// Handles are cheap to clone. Disconnecting through any clone is visible
/// through all of them, and two handles compare equal when they address the
/// same slot of the same signal.
///
/// Dropping a `Connection` does **not** disconnect the slot; use
/// [`ScopedConnection`] for that.
///
/// ```
/// use slotline::Signal;
///
/// let signal = Signal::<u32>::new();
/// let conn = signal.connect(|_| {});
/// let copy = conn.clone();
///
/// copy.disconnect();
/// assert!(!conn.connected());
/// drop(signal);
/// // Still safe to query after the signal is gone.
/// assert!(!conn.connected());
/// conn.disconnect();
/// ```
#[derive(Clone)]
pub struct Connection {
    control: Weak<dyn Control>,
    id: SlotId,
}

impl Default for Connection {
    /// An empty handle that is never connected.
    fn default() -> Self {
        Self {
            control: Weak::<Detached>::new(),
            id: SlotId::NONE,
        }
    }
}

impl Connection {
    pub(crate) fn new(control: Weak<dyn Control>, id: SlotId) -> Self {
        Self { control, id }
    }

    /// Id of the addressed slot.
    #[inline]
    pub fn id(&self) -> SlotId {
        self.id
    }

    /// Returns `true` while the slot is registered and its signal still exists.
    pub fn connected(&self) -> bool {
        self.control
            .upgrade()
            .is_some_and(|control| control.connected(self.id))
    }

    /// Disconnects the slot.
    ///
    /// Does nothing if the slot was already disconnected or the signal has
    /// been dropped. Safe to call from inside the slot itself.
    pub fn disconnect(&self) {
        if let Some(control) = self.control.upgrade() {
            control.disconnect(self.id);
        }
    }

    /// Wraps this handle in a guard that disconnects it when dropped.
    #[must_use = "dropping the guard immediately disconnects the slot"]
    pub fn scoped(self) -> ScopedConnection {
        ScopedConnection::new(self)
    }

    /// Returns `true` if this handle was issued by the signal owning `control`.
    pub(crate) fn belongs_to(&self, control: &Weak<dyn Control>) -> bool {
        Weak::ptr_eq(&self.control, control)
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.control, &other.control)
    }
}

impl Eq for Connection {}

impl Hash for Connection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.control.as_ptr().cast::<()>().hash(state);
        self.id.hash(state);
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.connected())
            .finish()
    }
}
