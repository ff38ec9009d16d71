//! Stable event ordering for deterministic aggregation.

use crate::domain::TradeEvent;

/// Ordering key for trade events: block_time -> seq (arrival order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventOrderingKey {
    /// Block time in seconds (primary sort).
    pub block_time: i64,
    /// Arrival index (tie-breaker).
    pub seq: u64,
}

impl EventOrderingKey {
    pub fn from_event(event: &TradeEvent) -> Self {
        EventOrderingKey {
            block_time: event.block_time.as_secs(),
            seq: event.seq,
        }
    }
}

/// True when `events` is already non-decreasing by [`EventOrderingKey`].
pub fn is_chronological(events: &[TradeEvent]) -> bool {
    events
        .windows(2)
        .all(|w| EventOrderingKey::from_event(&w[0]) <= EventOrderingKey::from_event(&w[1]))
}

/// Sort events chronologically. The sort is stable, so events sharing a
/// key keep their relative order.
pub fn sort_events_chronological(events: &mut [TradeEvent]) {
    events.sort_by_key(EventOrderingKey::from_event);
}
