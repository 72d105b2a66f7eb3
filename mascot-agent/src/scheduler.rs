//! Logical-clock timer queue
//!
//! All asynchronous behaviour of an agent (frame timers, transition
//! completions, bubble fades) goes through one [`Scheduler`]. Time only moves
//! when the host advances it, which keeps playback deterministic and lets tests
//! step through animations without sleeping.

use std::collections::BTreeMap;

/// Handle to a scheduled event.
///
/// Ordered by due time, then by insertion, which is also the firing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    due_ms: u64,
    seq: u64,
}

impl TimerId {
    /// Logical time at which the event fires
    pub fn due_ms(&self) -> u64 {
        self.due_ms
    }
}

/// Single-shot timers over a millisecond logical clock
#[derive(Debug)]
pub struct Scheduler<E> {
    now_ms: u64,
    next_seq: u64,
    pending: BTreeMap<TimerId, E>,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    /// Creates an empty scheduler at time zero
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Current logical time
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Schedules `event` to fire `delay_ms` after the current time
    pub fn schedule(&mut self, delay_ms: u64, event: E) -> TimerId {
        let id = TimerId {
            due_ms: self.now_ms.saturating_add(delay_ms),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending.insert(id, event);
        id
    }

    /// Cancels a pending event, returning it if it had not fired yet
    pub fn cancel(&mut self, id: TimerId) -> Option<E> {
        self.pending.remove(&id)
    }

    /// Pops the earliest event due at or before `until_ms`.
    ///
    /// The clock is moved to the event's due time so handlers scheduling
    /// follow-ups measure their delay from the moment the event fired.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<(TimerId, E)> {
        let (&id, _) = self.pending.first_key_value()?;
        if id.due_ms > until_ms {
            return None;
        }
        let (id, event) = self.pending.pop_first()?;
        self.now_ms = self.now_ms.max(id.due_ms);
        Some((id, event))
    }

    /// Moves the clock forward; never backwards
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }

    /// Due time of the earliest pending event
    pub fn next_due(&self) -> Option<u64> {
        self.pending.keys().next().map(|id| id.due_ms)
    }

    /// Whether the timer is still pending
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_then_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(200, "late");
        scheduler.schedule(100, "first");
        scheduler.schedule(100, "second");

        let fired: Vec<_> = std::iter::from_fn(|| scheduler.pop_due(1000))
            .map(|(_, e)| e)
            .collect();

        assert_eq!(fired, vec!["first", "second", "late"]);
        assert_eq!(scheduler.now(), 200);
    }

    #[test]
    fn test_pop_due_respects_limit() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(500, ());

        assert!(scheduler.pop_due(499).is_none());
        assert_eq!(scheduler.now(), 0);
        assert!(scheduler.pop_due(500).is_some());
        assert_eq!(scheduler.now(), 500);
    }

    #[test]
    fn test_cancel_removes_event() {
        let mut scheduler = Scheduler::new();
        let id = scheduler.schedule(10, 1);
        scheduler.schedule(20, 2);

        assert!(scheduler.is_pending(id));
        assert_eq!(scheduler.cancel(id), Some(1));
        assert!(!scheduler.is_pending(id));
        assert_eq!(scheduler.cancel(id), None);
        assert_eq!(scheduler.pop_due(100).map(|(_, e)| e), Some(2));
    }

    #[test]
    fn test_delay_measured_from_fire_time() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(100, "tick");
        scheduler.pop_due(1000);

        let id = scheduler.schedule(50, "tock");
        assert_eq!(id.due_ms(), 150);
    }

    #[test]
    fn test_clock_never_goes_backwards() {
        let mut scheduler: Scheduler<()> = Scheduler::new();
        scheduler.set_now(300);
        scheduler.set_now(100);
        assert_eq!(scheduler.now(), 300);
    }
}
