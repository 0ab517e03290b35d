//! Three-level ready queues
//!
//! Plain ordered id lists, one per level. A pid is present in at most one
//! list at a time, and only while its process is `ready`. Selection is
//! deterministic: Q0 and Q2 are FIFO, Q1 takes the lowest numeric
//! priority value with ties broken by queue order.

use core_types::{Pid, QueueLevel};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReadyQueues {
    pub q0: VecDeque<Pid>,
    pub q1: VecDeque<Pid>,
    pub q2: VecDeque<Pid>,
}

impl ReadyQueues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self, level: QueueLevel) -> &VecDeque<Pid> {
        match level {
            QueueLevel::Q0 => &self.q0,
            QueueLevel::Q1 => &self.q1,
            QueueLevel::Q2 => &self.q2,
        }
    }

    fn level_mut(&mut self, level: QueueLevel) -> &mut VecDeque<Pid> {
        match level {
            QueueLevel::Q0 => &mut self.q0,
            QueueLevel::Q1 => &mut self.q1,
            QueueLevel::Q2 => &mut self.q2,
        }
    }

    /// Appends to the tail of a level unless the pid is already queued there
    pub fn enqueue_if_absent(&mut self, level: QueueLevel, pid: Pid) {
        let queue = self.level_mut(level);
        if !queue.contains(&pid) {
            queue.push_back(pid);
        }
    }

    /// Drops a pid from every level
    pub fn remove_everywhere(&mut self, pid: Pid) {
        self.q0.retain(|&p| p != pid);
        self.q1.retain(|&p| p != pid);
        self.q2.retain(|&p| p != pid);
    }

    /// Number of levels currently holding this pid
    pub fn membership_count(&self, pid: Pid) -> usize {
        [&self.q0, &self.q1, &self.q2]
            .iter()
            .filter(|q| q.contains(&pid))
            .count()
    }

    pub fn pop_front(&mut self, level: QueueLevel) -> Option<Pid> {
        self.level_mut(level).pop_front()
    }

    /// Removes and returns the Q1 member with the lowest numeric priority
    /// value; ties keep queue order, the rest of the queue is untouched
    pub fn take_min_priority_q1<F>(&mut self, priority_of: F) -> Option<Pid>
    where
        F: Fn(Pid) -> Option<u32>,
    {
        if self.q1.is_empty() {
            return None;
        }
        let mut best_index = 0;
        let mut best_priority = u32::MAX;
        for (index, &pid) in self.q1.iter().enumerate() {
            let priority = priority_of(pid).unwrap_or(u32::MAX);
            if priority < best_priority {
                best_priority = priority;
                best_index = index;
            }
        }
        self.q1.remove(best_index)
    }

    pub fn is_empty(&self) -> bool {
        self.q0.is_empty() && self.q1.is_empty() && self.q2.is_empty()
    }
}
