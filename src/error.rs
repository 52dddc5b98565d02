//! Error types raised by [`Signal`](crate::Signal).
//!
//! Both variants are contract violations rather than transient failures: they
//! are surfaced to the caller immediately and never retried. Everything else
//! (disconnecting twice, querying a handle after its signal was dropped) is a
//! silent no-op.

use thiserror::Error;

/// # Errors produced by a signal.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalError {
    /// The slot id counter would overflow. Ids are never wrapped or reused.
    #[error("slot id space exhausted; ids are never reused")]
    IdSpaceExhausted,

    /// The signal was asked to relocate its slots while an emission was running.
    #[error("signal cannot be relocated while emitting (emission depth {depth})")]
    InvalidUseWhileEmitting {
        /// Emission depth observed when the relocation was rejected.
        depth: u32,
    },
}

impl SignalError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use slotline::SignalError;
    ///
    /// assert_eq!(SignalError::IdSpaceExhausted.as_label(), "id_space_exhausted");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SignalError::IdSpaceExhausted => "id_space_exhausted",
            SignalError::InvalidUseWhileEmitting { .. } => "invalid_use_while_emitting",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(
            SignalError::InvalidUseWhileEmitting { depth: 2 }.as_label(),
            "invalid_use_while_emitting"
        );
        assert_eq!(SignalError::IdSpaceExhausted.as_label(), "id_space_exhausted");
    }

    #[test]
    fn test_display_mentions_depth() {
        let err = SignalError::InvalidUseWhileEmitting { depth: 3 };
        assert_eq!(
            err.to_string(),
            "signal cannot be relocated while emitting (emission depth 3)"
        );
    }
}
