use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::chain::PollCreatedEvent;

/// One betting round, derived from its `PollCreated` event.
///
/// Immutable once stored and never deleted; retained for audit and
/// idempotency checks. Re-deriving the record from a duplicate event
/// delivery overwrites it with identical fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub poll_id: u64,
    pub start_time: u64,
    pub end_time: u64,
    pub creator: Address,
    pub mode: u8,
}

impl Poll {
    pub fn from_event(event: &PollCreatedEvent) -> Self {
        Self {
            poll_id: event.poll_id,
            start_time: event.start_time,
            end_time: event.start_time + event.duration,
            creator: event.creator,
            mode: event.mode,
        }
    }

    /// A poll is open until its betting window has elapsed.
    pub fn is_open(&self, now: u64) -> bool {
        self.end_time >= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::testing::poll_event;

    #[test]
    fn end_time_is_start_plus_duration() {
        let poll = Poll::from_event(&poll_event(1, 1000, 500, 5));
        assert_eq!(poll.end_time, 1500);
        assert!(poll.is_open(1200));
        assert!(poll.is_open(1500));
        assert!(!poll.is_open(1600));
    }
}
