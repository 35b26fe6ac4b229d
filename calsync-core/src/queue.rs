//! Time-ordered queue of pending change events.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};

/// Maps "earliest time worth retrying" to calendar indexes.
///
/// A calendar may be queued many times while the user keeps saving;
/// [`drain_due`](ChangeQueue::drain_due) collapses those into one.
#[derive(Debug, Default)]
pub struct ChangeQueue {
    entries: BTreeMap<DateTime<Utc>, Vec<usize>>,
}

impl ChangeQueue {
    pub fn new() -> Self {
        ChangeQueue::default()
    }

    pub fn push(&mut self, at: DateTime<Utc>, resource: usize) {
        self.entries.entry(at).or_default().push(resource);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// When the earliest entry matures.
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.entries.keys().next().copied()
    }

    /// Remove every entry due at or before `now`.
    ///
    /// Returns each calendar once, in order of its earliest due entry.
    pub fn drain_due(&mut self, now: DateTime<Utc>) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut due = Vec::new();

        while let Some(entry) = self.entries.first_entry() {
            if *entry.key() > now {
                break;
            }
            for resource in entry.remove() {
                if seen.insert(resource) {
                    due.push(resource);
                }
            }
        }

        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn drains_only_due_entries_in_time_order() {
        let now = Utc::now();
        let mut queue = ChangeQueue::new();
        queue.push(now + TimeDelta::seconds(5), 0);
        queue.push(now - TimeDelta::seconds(1), 2);
        queue.push(now - TimeDelta::seconds(3), 1);

        assert_eq!(queue.drain_due(now), vec![1, 2]);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.next_due(), Some(now + TimeDelta::seconds(5)));
    }

    #[test]
    fn repeated_entries_for_one_calendar_drain_once() {
        let now = Utc::now();
        let mut queue = ChangeQueue::new();
        queue.push(now - TimeDelta::seconds(3), 4);
        queue.push(now - TimeDelta::seconds(2), 4);
        queue.push(now - TimeDelta::seconds(1), 4);

        assert_eq!(queue.drain_due(now), vec![4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn entry_due_exactly_now_is_drained() {
        let now = Utc::now();
        let mut queue = ChangeQueue::new();
        queue.push(now, 0);
        queue.push(now, 1);

        assert_eq!(queue.drain_due(now), vec![0, 1]);
    }

    #[test]
    fn nothing_due() {
        let now = Utc::now();
        let mut queue = ChangeQueue::new();
        queue.push(now + TimeDelta::seconds(1), 0);

        assert!(queue.drain_due(now).is_empty());
        assert!(!queue.is_empty());
    }
}
