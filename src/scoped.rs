use crate::connection::Connection;

/// An RAII guard that disconnects its slot when dropped.
///
/// A `ScopedConnection` is the single owner of the "disconnect on scope exit"
/// obligation, so it can be moved but not cloned. Use
/// [`release`](ScopedConnection::release) to take the handle back out and keep
/// the slot connected.
///
/// ```
/// use slotline::Signal;
///
/// let signal = Signal::<()>::new();
/// {
///     let _guard = signal.scoped(signal.connect(|()| {}));
///     assert_eq!(signal.slot_count(), 1);
/// }
/// assert!(signal.is_empty());
/// ```
#[derive(Debug, Default)]
#[must_use = "dropping the guard immediately disconnects the slot"]
pub struct ScopedConnection {
    connection: Connection,
}

impl ScopedConnection {
    /// Takes over the disconnect obligation of `connection`.
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// The guarded handle.
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Returns `true` while the guarded slot is connected.
    pub fn connected(&self) -> bool {
        self.connection.connected()
    }

    /// Disconnects the currently guarded slot, then guards `connection` instead.
    pub fn set(&mut self, connection: Connection) {
        let previous = std::mem::replace(&mut self.connection, connection);
        previous.disconnect();
    }

    /// Disarms the guard and returns the handle; the slot stays connected.
    pub fn release(mut self) -> Connection {
        std::mem::take(&mut self.connection)
    }
}

impl From<Connection> for ScopedConnection {
    fn from(connection: Connection) -> Self {
        Self::new(connection)
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        self.connection.disconnect();
    }
}
