//! Defines [`Signal`], the slot registry and its reentrancy-safe emission engine.
//!
//! A signal is built for the case where emitting is far more frequent than
//! connecting: slots live in one contiguous, id-ordered vector and an emission
//! is a single forward walk over it. Slots may connect, disconnect, clear the
//! signal or emit it again while an emission is running. Structural cleanup is
//! deferred until the outermost emission returns.
//!
//! The signal is single-threaded (`!Send`, `!Sync`). Sharing it across threads
//! would need an external lock around every operation plus a snapshotting
//! emission strategy, neither of which is provided here.

use crate::connection::{Connection, Control};
use crate::error::SignalError;
use crate::scoped::ScopedConnection;
use crate::slot::Callback;
use crate::slot_id::SlotId;
use crate::store::{Reclaimed, SlotStore, Visit};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// State shared between a signal and the handles it issued.
///
/// Only the owning [`Signal`] holds a strong reference; handles hold weak
/// ones. Dropping the signal therefore frees every record while leaving the
/// handles able to observe that their slot is gone.
struct Shared<A> {
    store: RefCell<SlotStore<A>>,
}

impl<A> Shared<A> {
    fn new(store: SlotStore<A>) -> Rc<Self> {
        Rc::new(Self {
            store: RefCell::new(store),
        })
    }
}

impl<A> Control for Shared<A> {
    fn connected(&self, id: SlotId) -> bool {
        self.store.borrow().is_connected(id)
    }

    fn disconnect(&self, id: SlotId) {
        self.store.borrow_mut().disconnect(id);
    }
}

/// An RAII guard for one emission level.
///
/// Entering bumps the store's emission depth; dropping the guard (on normal
/// return or while unwinding out of a panicking slot) lowers it again and
/// compacts the store once the outermost level exits.
struct EmitScope<'a, A> {
    shared: &'a Shared<A>,
}

impl<'a, A> EmitScope<'a, A> {
    /// Opens a level and returns it with the `start..end` bounds of its pass.
    fn enter(shared: &'a Shared<A>) -> (Self, usize, usize) {
        let (start, end) = shared.store.borrow_mut().enter();
        (Self { shared }, start, end)
    }
}

impl<A> Drop for EmitScope<'_, A> {
    fn drop(&mut self) {
        // Dropped after the store borrow ends: a reclaimed callback may own a
        // `ScopedConnection` into this very signal.
        let reclaimed: Reclaimed<A> = self.shared.store.borrow_mut().exit();
        drop(reclaimed);
    }
}

/// A registry of callbacks ("slots") invoked together by [`emit`](Signal::emit).
///
/// `A` is the argument passed to every slot. Use a tuple for several values
/// and `()` for none. Slots are `Fn(A)` closures; they return nothing, and
/// use interior mutability for any state they update.
///
/// # Reentrancy
///
/// Every method takes `&self`, so a slot may call back into the signal while
/// it is being emitted:
///
/// * A slot connected during an emission is not visited by that call's own
///   pass. It is visited by any `emit` started afterwards, including nested
///   ones triggered from inside the pass.
/// * A slot disconnected during an emission is skipped for the rest of every
///   pass still in flight.
/// * [`disconnect_all`](Signal::disconnect_all) during an emission stops all
///   in-flight passes; slots connected after it survive.
/// * Disconnected slots are physically removed once, when the outermost emit
///   returns.
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use slotline::Signal;
///
/// let signal = Signal::<u32>::new();
/// let total = Rc::new(Cell::new(0));
///
/// let conn = {
///     let total = total.clone();
///     signal.connect(move |n| total.set(total.get() + n))
/// };
/// signal.emit(5);
/// signal.disconnect(&conn);
/// signal.emit(5);
///
/// assert_eq!(total.get(), 5);
/// assert!(signal.is_empty());
/// ```
pub struct Signal<A> {
    shared: RefCell<Rc<Shared<A>>>,
}

impl<A: 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> Signal<A> {
    /// Creates a signal with no slots.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a signal with room for `capacity` slots before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_store(SlotStore::with_capacity(capacity))
    }

    fn from_store(store: SlotStore<A>) -> Self {
        Self {
            shared: RefCell::new(Shared::new(store)),
        }
    }

    fn control(shared: &Rc<Shared<A>>) -> Weak<dyn Control> {
        Rc::downgrade(shared) as Weak<dyn Control>
    }

    fn try_connect_callback(
        &self,
        make: impl FnOnce(Connection) -> Callback<A>,
    ) -> Result<Connection, SignalError> {
        let shared = self.shared.borrow();
        let control = Self::control(&shared);
        let id = shared.store.borrow_mut().next_id()?;
        let callback = make(Connection::new(control.clone(), id));
        shared.store.borrow_mut().insert(id, callback);
        Ok(Connection::new(control, id))
    }

    /// Connects `slot` and returns its handle.
    ///
    /// Fails with [`SignalError::IdSpaceExhausted`] once the signal has issued
    /// every id it can; ids are never reused.
    pub fn try_connect(&self, slot: impl Fn(A) + 'static) -> Result<Connection, SignalError> {
        self.try_connect_callback(|_| Rc::new(slot) as Callback<A>)
    }

    /// Connects `slot` and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if the slot id space is exhausted. See [`try_connect`](Signal::try_connect).
    pub fn connect(&self, slot: impl Fn(A) + 'static) -> Connection {
        self.try_connect(slot).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Connects a slot that is invoked at most once.
    ///
    /// The slot disconnects itself before it runs, so it stays single-shot
    /// even if it re-emits the signal from inside its own body.
    pub fn try_connect_once(&self, slot: impl Fn(A) + 'static) -> Result<Connection, SignalError> {
        self.try_connect_callback(|connection| {
            Rc::new(move |args: A| {
                if !connection.connected() {
                    return;
                }
                connection.disconnect();
                slot(args);
            }) as Callback<A>
        })
    }

    /// Connects a slot that is invoked at most once.
    ///
    /// # Panics
    ///
    /// Panics if the slot id space is exhausted.
    pub fn connect_once(&self, slot: impl Fn(A) + 'static) -> Connection {
        self.try_connect_once(slot).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Connects a slot that receives its own [`Connection`] alongside the
    /// arguments, so it can disconnect itself.
    pub fn try_connect_extended(
        &self,
        slot: impl Fn(&Connection, A) + 'static,
    ) -> Result<Connection, SignalError> {
        self.try_connect_callback(|connection| {
            Rc::new(move |args: A| slot(&connection, args)) as Callback<A>
        })
    }

    /// Connects a slot that receives its own [`Connection`].
    ///
    /// # Panics
    ///
    /// Panics if the slot id space is exhausted.
    pub fn connect_extended(&self, slot: impl Fn(&Connection, A) + 'static) -> Connection {
        self.try_connect_extended(slot)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Connects a slot that is held only weakly.
    ///
    /// The signal keeps a [`Weak`] to `slot`, so the caller's `Rc` decides how
    /// long it lives. Once every strong reference is gone the slot disconnects
    /// itself the next time it would have been invoked.
    pub fn try_connect_weak<F>(&self, slot: &Rc<F>) -> Result<Connection, SignalError>
    where
        F: Fn(A) + ?Sized + 'static,
    {
        let slot = Rc::downgrade(slot);
        self.try_connect_extended(move |connection, args| match slot.upgrade() {
            Some(slot) => (*slot)(args),
            None => connection.disconnect(),
        })
    }

    /// Connects a slot that is held only weakly.
    ///
    /// # Panics
    ///
    /// Panics if the slot id space is exhausted.
    pub fn connect_weak<F>(&self, slot: &Rc<F>) -> Connection
    where
        F: Fn(A) + ?Sized + 'static,
    {
        self.try_connect_weak(slot)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Forwards every emission of this signal to `target`.
    ///
    /// Only a weak reference to `target` is kept. Once it has been dropped the
    /// forwarding slot disconnects itself the next time it is invoked.
    ///
    /// Forwarding a signal to itself recurses without bound.
    pub fn try_connect_signal(&self, target: &Rc<Signal<A>>) -> Result<Connection, SignalError>
    where
        A: Clone,
    {
        let target = Rc::downgrade(target);
        self.try_connect_extended(move |connection, args| match target.upgrade() {
            Some(target) => target.emit(args),
            None => connection.disconnect(),
        })
    }

    /// Forwards every emission of this signal to `target`.
    ///
    /// # Panics
    ///
    /// Panics if the slot id space is exhausted.
    pub fn connect_signal(&self, target: &Rc<Signal<A>>) -> Connection
    where
        A: Clone,
    {
        self.try_connect_signal(target)
            .unwrap_or_else(|err| panic!("{err}"))
    }

    /// Guards `connection` so it is disconnected when the guard is dropped.
    pub fn scoped(&self, connection: Connection) -> ScopedConnection {
        ScopedConnection::new(connection)
    }

    /// Invokes every connected slot, in connection order, with `args`.
    ///
    /// Each slot but the last one of the pass receives a clone of `args`; the
    /// last receives `args` itself, so one clone is always saved. That holds
    /// even when the pass's tail is disconnected while it runs.
    ///
    /// See the [type-level docs](Signal#reentrancy) for what slots may do to
    /// the signal while it is being emitted. A panic in a slot propagates to
    /// the caller after the signal has restored its bookkeeping.
    pub fn emit(&self, args: A)
    where
        A: Clone,
    {
        let shared = self.shared.borrow();
        if shared.store.borrow().live_count() == 0 {
            let reclaimed = shared.store.borrow_mut().compact();
            drop(reclaimed);
            return;
        }

        let (_scope, start, end) = EmitScope::enter(&shared);
        let mut last = shared.store.borrow().last_live(start, end);
        let mut args = Some(args);

        for index in start..end {
            let callback = {
                let store = shared.store.borrow();
                let callback = match store.visit(index) {
                    Visit::Invoke(callback) => callback,
                    Visit::Skip => continue,
                    Visit::Stop => break,
                };
                last = store.refresh_last(index, last);
                callback
            };

            if Some(index) == last {
                if let Some(args) = args.take() {
                    callback(args);
                }
                break;
            }
            match &args {
                Some(args) => callback(args.clone()),
                None => break,
            }
        }
    }

    /// Disconnects the slot addressed by `connection`.
    ///
    /// Handles issued by another signal, and slots already disconnected, are
    /// ignored.
    pub fn disconnect(&self, connection: &Connection) {
        let shared = self.shared.borrow();
        if connection.belongs_to(&Self::control(&shared)) {
            shared.store.borrow_mut().disconnect(connection.id());
        }
    }

    /// Disconnects every slot connected so far.
    ///
    /// Called from inside a slot, this stops every emission pass in flight:
    /// the running slot completes, slots not yet visited are skipped. Slots
    /// connected afterwards are unaffected.
    pub fn disconnect_all(&self) {
        let shared = self.shared.borrow();
        let reclaimed = shared.store.borrow_mut().disconnect_all();
        drop(reclaimed);
    }

    /// Returns `true` if `connection` addresses a live slot of this signal.
    pub fn connected(&self, connection: &Connection) -> bool {
        let shared = self.shared.borrow();
        connection.belongs_to(&Self::control(&shared))
            && shared.store.borrow().is_connected(connection.id())
    }

    /// Number of connected slots.
    pub fn slot_count(&self) -> usize {
        self.shared.borrow().store.borrow().live_count()
    }

    /// Returns `true` if no slot is connected.
    pub fn is_empty(&self) -> bool {
        self.slot_count() == 0
    }

    /// Number of slot records the signal can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.shared.borrow().store.borrow().capacity()
    }

    /// Number of slots that can still be connected before ids run out.
    pub fn remaining_slots(&self) -> u64 {
        self.shared.borrow().store.borrow().remaining_ids()
    }

    /// Returns `true` while an emission of this signal is in progress.
    pub fn is_emitting(&self) -> bool {
        self.emission_depth() > 0
    }

    /// Number of nested emissions currently in progress.
    pub fn emission_depth(&self) -> u32 {
        self.shared.borrow().store.borrow().emission_depth()
    }

    /// Removes disconnected slots from storage right away.
    ///
    /// Emission already does this when it returns, so calling it is only
    /// useful after disconnecting outside of an emission. Does nothing while
    /// an emission is in progress.
    pub fn compact(&self) {
        let shared = self.shared.borrow();
        let reclaimed = shared.store.borrow_mut().compact();
        drop(reclaimed);
    }

    /// Exchanges the slots of two signals.
    ///
    /// Handles follow their slots: a handle issued by `self` addresses `other`
    /// afterwards, and vice versa.
    ///
    /// Fails with [`SignalError::InvalidUseWhileEmitting`] if either signal is
    /// being emitted, since that would pull the slots out from under the
    /// running pass.
    pub fn swap(&self, other: &Signal<A>) -> Result<(), SignalError> {
        if std::ptr::eq(self, other) {
            return Ok(());
        }

        if let (Ok(mut mine), Ok(mut theirs)) =
            (self.shared.try_borrow_mut(), other.shared.try_borrow_mut())
        {
            std::mem::swap(&mut *mine, &mut *theirs);
            return Ok(());
        }

        let depth = self.emission_depth().max(other.emission_depth());
        tracing::warn!(depth, "rejected swap of a signal that is being emitted");
        Err(SignalError::InvalidUseWhileEmitting { depth })
    }

    #[cfg(test)]
    pub(crate) fn with_ids(ids: crate::slot_id::SlotIds) -> Self {
        Self::from_store(SlotStore::with_ids(0, ids))
    }
}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.borrow();
        let store = shared.store.borrow();
        f.debug_struct("Signal")
            .field("slot_count", &store.live_count())
            .field("emission_depth", &store.emission_depth())
            .finish()
    }
}
