//! Ordered slot storage with tombstones and deferred compaction.
//!
//! Records are appended in id order and are never physically removed while an
//! emission is in flight; disconnecting only flips the record's `connected`
//! flag. Indices taken by an emission pass therefore stay valid for the whole
//! call stack, however the store is mutated reentrantly. Dead records are
//! reclaimed by [`SlotStore::compact`] once the outermost emission returns.
//!
//! Methods that remove records hand them back to the caller instead of
//! dropping them in place. A slot's captured state may itself touch the store
//! when dropped (a [`ScopedConnection`](crate::ScopedConnection) captured by a
//! closure, for instance), so the caller drops the removed records only after
//! releasing its borrow of the store.

use crate::error::SignalError;
use crate::slot::{Callback, SlotRecord};
use crate::slot_id::{SlotId, SlotIds};
use std::rc::Rc;

/// Records removed from the store, to be dropped outside the store borrow.
pub(crate) type Reclaimed<A> = Vec<SlotRecord<A>>;

/// What the emission loop should do with one index of its pass.
pub(crate) enum Visit<A> {
    /// A `disconnect_all` cancelled the rest of this pass.
    Stop,
    /// The record is disconnected.
    Skip,
    Invoke(Callback<A>),
}

#[derive(Debug)]
pub(crate) struct SlotStore<A> {
    records: Vec<SlotRecord<A>>,
    live_count: usize,
    emission_depth: u32,
    /// Records before this index were cancelled by a reentrant `disconnect_all`.
    reclaim_from: usize,
    ids: SlotIds,
    cancel_all_requested: bool,
}

impl<A> SlotStore<A> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self::with_ids(capacity, SlotIds::default())
    }

    pub(crate) fn with_ids(capacity: usize, ids: SlotIds) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            live_count: 0,
            emission_depth: 0,
            reclaim_from: 0,
            ids,
            cancel_all_requested: false,
        }
    }

    #[inline]
    pub(crate) fn live_count(&self) -> usize {
        self.live_count
    }

    #[inline]
    pub(crate) fn emission_depth(&self) -> u32 {
        self.emission_depth
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.records.capacity()
    }

    pub(crate) fn remaining_ids(&self) -> u64 {
        self.ids.remaining()
    }

    /// Reserves the id of the next slot.
    ///
    /// Kept apart from [`insert`](SlotStore::insert) so self-referencing
    /// adapters (`connect_once`, `connect_extended`) can capture their own
    /// connection, and so a callback refused for lack of ids is dropped
    /// outside the store borrow.
    pub(crate) fn next_id(&mut self) -> Result<SlotId, SignalError> {
        self.ids.next_id()
    }

    /// Appends the record for an id just returned by [`next_id`](SlotStore::next_id).
    pub(crate) fn insert(&mut self, id: SlotId, callback: Callback<A>) {
        debug_assert!(self.records.last().is_none_or(|last| last.id < id));
        self.records
            .push(SlotRecord::new(id, callback, self.emission_depth));
        self.live_count += 1;

        tracing::trace!(id = %id, depth = self.emission_depth, live = self.live_count, "slot connected");
    }

    #[cfg(test)]
    pub(crate) fn connect(&mut self, callback: Callback<A>) -> Result<SlotId, SignalError> {
        let id = self.next_id()?;
        self.insert(id, callback);
        Ok(id)
    }

    fn position(&self, id: SlotId) -> Option<usize> {
        let offset = self.reclaim_from;
        self.records[offset..]
            .binary_search_by_key(&id, |record| record.id)
            .ok()
            .map(|index| index + offset)
    }

    /// Finds a record that has not been compacted or cancelled yet.
    pub(crate) fn lookup(&self, id: SlotId) -> Option<&SlotRecord<A>> {
        self.position(id).map(|index| &self.records[index])
    }

    pub(crate) fn is_connected(&self, id: SlotId) -> bool {
        self.lookup(id).is_some_and(|record| record.connected)
    }

    /// Marks the record disconnected. Unknown or already disconnected ids are
    /// ignored. Returns `true` if a live record was disconnected.
    pub(crate) fn disconnect(&mut self, id: SlotId) -> bool {
        let Some(index) = self.position(id) else {
            return false;
        };

        if !self.records[index].disconnect() {
            return false;
        }

        self.live_count -= 1;
        tracing::trace!(id = %id, depth = self.emission_depth, live = self.live_count, "slot disconnected");
        true
    }

    /// Disconnects every slot that exists right now.
    ///
    /// When idle the records are removed outright. During an emission the
    /// records are only tombstoned and the in-flight passes are told to stop;
    /// slots connected after this call land past `reclaim_from` and survive.
    pub(crate) fn disconnect_all(&mut self) -> Reclaimed<A> {
        if self.emission_depth == 0 {
            self.live_count = 0;
            self.reclaim_from = 0;
            self.cancel_all_requested = false;
            let capacity = self.records.capacity();
            return std::mem::replace(&mut self.records, Vec::with_capacity(capacity));
        }

        for record in &mut self.records[self.reclaim_from..] {
            record.disconnect();
        }
        self.live_count = 0;
        self.reclaim_from = self.records.len();
        self.cancel_all_requested = true;

        tracing::debug!(
            depth = self.emission_depth,
            reclaim_from = self.reclaim_from,
            "disconnect_all deferred until emission completes"
        );
        Vec::new()
    }

    /// Physically removes disconnected records, keeping the survivors in id
    /// order. Does nothing while an emission is in flight.
    pub(crate) fn compact(&mut self) -> Reclaimed<A> {
        if self.emission_depth > 0 {
            return Vec::new();
        }
        if self.reclaim_from == 0 && self.records.len() == self.live_count {
            self.cancel_all_requested = false;
            return Vec::new();
        }

        let mut reclaimed: Reclaimed<A> = self.records.drain(..self.reclaim_from).collect();
        reclaimed.extend(self.records.extract_if(.., |record| !record.connected));
        self.reclaim_from = 0;
        self.cancel_all_requested = false;

        debug_assert_eq!(self.records.len(), self.live_count);
        tracing::trace!(
            reclaimed = reclaimed.len(),
            live = self.live_count,
            "slot store compacted"
        );
        reclaimed
    }

    /// Opens one emission level and returns the bounds of its pass.
    ///
    /// Records appended after this call are past `end` and are not visited by
    /// this pass.
    pub(crate) fn enter(&mut self) -> (usize, usize) {
        self.emission_depth += 1;
        (self.reclaim_from, self.records.len())
    }

    /// Closes one emission level, compacting once the outermost one exits.
    pub(crate) fn exit(&mut self) -> Reclaimed<A> {
        debug_assert!(self.emission_depth > 0, "unbalanced emission exit");
        self.emission_depth = self.emission_depth.saturating_sub(1);
        if self.emission_depth == 0 {
            self.compact()
        } else {
            Vec::new()
        }
    }

    /// Index of the last live record in `start..end`, if any.
    ///
    /// Records past it in the same range are dead and cannot come back, so the
    /// slot at this index is the final recipient of the pass unless it gets
    /// disconnected first.
    pub(crate) fn last_live(&self, start: usize, end: usize) -> Option<usize> {
        self.records
            .get(start..end)?
            .iter()
            .rposition(|record| record.connected)
            .map(|index| index + start)
    }

    /// Re-checks the final recipient of a pass standing at `index`.
    ///
    /// If `last` was disconnected since the pass started, the recipient moves
    /// back to the last live record in `index..last`. It only ever moves
    /// backwards, so a pass scans each dead record at most once here.
    pub(crate) fn refresh_last(&self, index: usize, last: Option<usize>) -> Option<usize> {
        match last {
            Some(last) if !self.records.get(last).is_some_and(|record| record.connected) => {
                self.last_live(index, last)
            }
            other => other,
        }
    }

    pub(crate) fn visit(&self, index: usize) -> Visit<A> {
        if self.cancel_all_requested && index < self.reclaim_from {
            return Visit::Stop;
        }
        match self.records.get(index) {
            Some(record) if record.connected => Visit::Invoke(Rc::clone(&record.callback)),
            Some(_) => Visit::Skip,
            None => Visit::Stop,
        }
    }
}
