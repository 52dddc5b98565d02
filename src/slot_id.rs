use crate::error::SignalError;
use std::cmp::Ordering as CmpOrdering;
use std::fmt;

/// Identity of one connected slot within a signal.
///
/// Ids are handed out in strictly increasing order and never reused, so
/// comparing two ids of the same signal tells which slot was connected first.
/// `SlotId(0)` is never issued; it is the id carried by an empty
/// [`Connection`](crate::Connection).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(u64);

impl SlotId {
    pub(crate) const NONE: SlotId = SlotId(0);

    /// Raw numeric value of the id.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl PartialEq<u64> for SlotId {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

impl PartialOrd<u64> for SlotId {
    fn partial_cmp(&self, other: &u64) -> Option<CmpOrdering> {
        Some(self.0.cmp(other))
    }
}

/// Monotonic id generator owned by one slot store.
#[derive(Debug)]
pub(crate) struct SlotIds {
    next: u64,
}

impl Default for SlotIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl SlotIds {
    #[cfg(test)]
    pub(crate) fn starting_at(next: u64) -> Self {
        Self { next }
    }

    /// Number of ids that can still be issued.
    pub(crate) fn remaining(&self) -> u64 {
        u64::MAX - self.next
    }

    /// Issues the next id.
    ///
    /// Fails instead of wrapping once the counter cannot advance any further,
    /// which means `u64::MAX` itself is never issued.
    pub(crate) fn next_id(&mut self) -> Result<SlotId, SignalError> {
        let id = self.next;
        self.next = id.checked_add(1).ok_or(SignalError::IdSpaceExhausted)?;
        Ok(SlotId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one_and_increase() {
        let mut ids = SlotIds::default();

        let first = ids.next_id().unwrap();
        let second = ids.next_id().unwrap();
        let third = ids.next_id().unwrap();

        assert_eq!(first, 1);
        assert!(first < second);
        assert!(second < third);
        assert_ne!(first, SlotId::NONE);
    }

    #[test]
    fn test_exhaustion_is_reported_not_wrapped() {
        let mut ids = SlotIds::starting_at(u64::MAX - 2);
        assert_eq!(ids.remaining(), 2);

        assert_eq!(ids.next_id().unwrap(), u64::MAX - 2);
        // The counter can still advance to MAX, so MAX - 1 is fine.
        assert_eq!(ids.next_id().unwrap(), u64::MAX - 1);
        // Issuing MAX would leave nothing to advance to.
        assert_eq!(ids.next_id(), Err(SignalError::IdSpaceExhausted));
        assert_eq!(ids.remaining(), 0);
        // Stays exhausted; never restarts from zero.
        assert_eq!(ids.next_id(), Err(SignalError::IdSpaceExhausted));
    }

    #[test]
    fn test_slot_id_ordering_against_raw() {
        let id = SlotId(10);

        assert!(id < 11);
        assert!(id > 9);
        assert!(id <= 10);
        assert_eq!(id, 10);
        assert_eq!(id.get(), 10);
        assert_eq!(id.to_string(), "#10");
    }
}
