//! Messages eligible for a one-shot retry when they are edited.

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::model::MessageId;

/// Concurrent set of message ids awaiting an edit.
///
/// Shared between the message path (which marks) and the edit path (which
/// takes). An entry older than the TTL counts as absent; stale entries are
/// swept out once every [`PRUNE_EVERY`] marks.
#[derive(Debug, Default)]
pub struct AwaitingEditSet {
    marks: DashMap<MessageId, Instant>,
    ttl: Option<Duration>,
    marked: AtomicUsize,
}

/// Number of marks between sweeps of expired entries.
pub const PRUNE_EVERY: usize = 64;

impl AwaitingEditSet {
    /// Set with the given expiry; `None` keeps marks until they are taken.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            marks: DashMap::new(),
            ttl,
            marked: AtomicUsize::new(0),
        }
    }

    /// Mark `id` as awaiting an edit, refreshing any existing mark.
    pub fn mark(&self, id: MessageId) {
        let now = Instant::now();
        let count = self.marked.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(ttl) = self.ttl.filter(|_| count % PRUNE_EVERY == 0) {
            self.marks.retain(|_, marked| now.duration_since(*marked) < ttl);
        }
        self.marks.insert(id, now);
    }

    /// Whether `id` carries a live mark.
    pub fn is_awaiting(&self, id: MessageId) -> bool {
        self.marks
            .get(&id)
            .is_some_and(|marked| self.is_live(*marked))
    }

    /// Remove the mark for `id`; returns `true` if a live mark was removed.
    pub fn take(&self, id: MessageId) -> bool {
        self.marks
            .remove(&id)
            .is_some_and(|(_, marked)| self.is_live(marked))
    }

    /// Remove the mark for `id`, if any.
    pub fn clear(&self, id: MessageId) {
        self.marks.remove(&id);
    }

    /// Number of stored marks, including expired ones not yet pruned.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Whether no marks are stored.
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    fn is_live(&self, marked: Instant) -> bool {
        self.ttl.is_none_or(|ttl| marked.elapsed() < ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_take_is_one_shot() {
        let set = AwaitingEditSet::new(None);
        set.mark(MessageId(1));
        assert!(set.is_awaiting(MessageId(1)));
        assert!(set.take(MessageId(1)));
        assert!(!set.take(MessageId(1)));
        assert!(!set.is_awaiting(MessageId(1)));
    }

    #[test]
    fn clear_removes_mark() {
        let set = AwaitingEditSet::new(None);
        set.mark(MessageId(7));
        set.clear(MessageId(7));
        set.clear(MessageId(8));
        assert!(set.is_empty());
    }

    #[test]
    fn expired_marks_are_absent_until_swept() {
        let set = AwaitingEditSet::new(Some(Duration::from_millis(20)));
        set.mark(MessageId(1));
        std::thread::sleep(Duration::from_millis(40));
        assert!(!set.is_awaiting(MessageId(1)));

        // A single mark does not sweep the whole set.
        set.mark(MessageId(2));
        assert_eq!(set.len(), 2);
        assert!(set.is_awaiting(MessageId(2)));

        for id in 3..=PRUNE_EVERY as u64 {
            set.mark(MessageId(id));
        }
        assert_eq!(set.len(), PRUNE_EVERY - 1);
        assert!(set.is_awaiting(MessageId(PRUNE_EVERY as u64)));
    }

    #[test]
    fn marks_without_ttl_are_never_swept() {
        let set = AwaitingEditSet::new(None);
        for id in 0..(2 * PRUNE_EVERY) as u64 {
            set.mark(MessageId(id));
        }
        assert_eq!(set.len(), 2 * PRUNE_EVERY);
    }

    #[test]
    fn expired_take_reports_false() {
        let set = AwaitingEditSet::new(Some(Duration::from_millis(10)));
        set.mark(MessageId(3));
        std::thread::sleep(Duration::from_millis(30));
        assert!(!set.take(MessageId(3)));
        assert!(set.is_empty());
    }
}
