//! Deferred actions
//!
//! A min-heap of `(fire_at_ms, seq, action)` owned by the simulation context
//! and polled once per tick. Actions scheduled for the same instant fire in
//! scheduling order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// Work to run later
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredAction {
    MapSwitch {
        target_map: String,
        trigger_id: Option<String>,
    },
}

/// Handle for cancelling a scheduled action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Scheduled {
    fire_at_ms: f64,
    seq: u64,
    action: DeferredAction,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed: BinaryHeap is a max-heap, the earliest entry must be on top
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .fire_at_ms
            .total_cmp(&self.fire_at_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Scheduled>,
    pending: HashSet<u64>,
    next_seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, fire_at_ms: f64, action: DeferredAction) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(seq);
        self.heap.push(Scheduled {
            fire_at_ms,
            seq,
            action,
        });
        TimerId(seq)
    }

    /// Cancel a pending action; returns false if it already fired
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id.0)
    }

    /// Remove and return every action due at `now_ms`
    pub fn poll(&mut self, now_ms: f64) -> Vec<DeferredAction> {
        let mut due = Vec::new();
        while self.heap.peek().is_some_and(|s| s.fire_at_ms <= now_ms) {
            let Some(entry) = self.heap.pop() else {
                break;
            };
            if self.pending.remove(&entry.seq) {
                due.push(entry.action);
            }
        }
        due
    }

    /// Number of actions still waiting
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.pending.clear();
    }
}
