//! Reset-on-activity debounce table.
//!
//! Each key is either idle (absent) or pending with a deadline. Scheduling a
//! pending key pushes its deadline out, so a burst fires once, `delay` after
//! its last event. Time is always passed in, which keeps the table free of
//! clocks and timers and lets tests use synthetic instants.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct PendingSignals<K> {
    deadlines: HashMap<K, Instant>,
}

impl<K: Eq + Hash + Clone> PendingSignals<K> {
    pub fn new() -> Self {
        Self {
            deadlines: HashMap::new(),
        }
    }

    /// Arm or re-arm `key` to fire at `now + delay`.
    ///
    /// Returns `true` if the key was idle, `false` if an earlier deadline was replaced.
    pub fn schedule(&mut self, key: K, now: Instant, delay: Duration) -> bool {
        self.deadlines.insert(key, now + delay).is_none()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.deadlines.contains_key(key)
    }

    /// Earliest outstanding deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every key whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_expired(&mut self, now: Instant) -> Vec<K> {
        let mut expired: Vec<(Instant, K)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(key, deadline)| (*deadline, key.clone()))
            .collect();

        for (_, key) in &expired {
            self.deadlines.remove(key);
        }

        expired.sort_by_key(|(deadline, _)| *deadline);
        expired.into_iter().map(|(_, key)| key).collect()
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for PendingSignals<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_fires_once_after_last_event() {
        let t0 = Instant::now();
        let mut pending = PendingSignals::new();

        assert!(pending.schedule("a", t0, ms(150)));
        assert!(!pending.schedule("a", t0 + ms(50), ms(150)));
        assert!(!pending.schedule("a", t0 + ms(120), ms(150)));

        assert!(pending.take_expired(t0 + ms(269)).is_empty());
        assert_eq!(pending.take_expired(t0 + ms(270)), vec!["a"]);
        assert!(pending.take_expired(t0 + ms(1000)).is_empty());
    }

    #[test]
    fn test_keys_are_independent() {
        let t0 = Instant::now();
        let mut pending = PendingSignals::new();

        pending.schedule("slow", t0, ms(300));
        pending.schedule("fast", t0 + ms(10), ms(100));
        assert_eq!(pending.next_deadline(), Some(t0 + ms(110)));

        assert_eq!(pending.take_expired(t0 + ms(110)), vec!["fast"]);
        assert!(pending.is_pending(&"slow"));
        assert_eq!(pending.take_expired(t0 + ms(300)), vec!["slow"]);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_expired_keys_come_out_earliest_first() {
        let t0 = Instant::now();
        let mut pending = PendingSignals::new();
        pending.schedule("late", t0, ms(30));
        pending.schedule("early", t0, ms(10));
        pending.schedule("middle", t0, ms(20));

        assert_eq!(
            pending.take_expired(t0 + ms(50)),
            vec!["early", "middle", "late"]
        );
    }

    #[test]
    fn test_clear_drops_everything_pending() {
        let t0 = Instant::now();
        let mut pending = PendingSignals::new();
        pending.schedule(1, t0, ms(10));
        pending.schedule(2, t0, ms(10));
        assert_eq!(pending.len(), 2);

        pending.clear();
        assert!(pending.take_expired(t0 + ms(100)).is_empty());
        assert_eq!(pending.next_deadline(), None);
    }
}
