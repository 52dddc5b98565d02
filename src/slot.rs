use crate::slot_id::SlotId;
use std::fmt;
use std::rc::Rc;

/// Type-erased slot callback.
///
/// Stored behind an `Rc` so the emission loop can clone it out of the store
/// and release the store borrow before invoking it.
pub(crate) type Callback<A> = Rc<dyn Fn(A)>;

/// One registered callback plus its identity and liveness flag.
pub(crate) struct SlotRecord<A> {
    pub(crate) id: SlotId,
    pub(crate) callback: Callback<A>,
    pub(crate) connected: bool,
    /// Emission depth at the moment the slot was connected; 0 when idle.
    pub(crate) created_at_depth: u32,
}

impl<A> SlotRecord<A> {
    pub(crate) fn new(id: SlotId, callback: Callback<A>, created_at_depth: u32) -> Self {
        Self {
            id,
            callback,
            connected: true,
            created_at_depth,
        }
    }

    /// Marks the record as disconnected. Returns `true` if it was live.
    #[inline]
    pub(crate) fn disconnect(&mut self) -> bool {
        std::mem::replace(&mut self.connected, false)
    }
}

impl<A> fmt::Debug for SlotRecord<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotRecord")
            .field("id", &self.id)
            .field("connected", &self.connected)
            .field("created_at_depth", &self.created_at_depth)
            .finish_non_exhaustive()
    }
}
