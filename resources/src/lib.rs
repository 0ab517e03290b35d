//! # Resources
//!
//! Mutually-exclusive, non-reentrant resource ownership for the MLFQ
//! simulator.
//!
//! ## Philosophy
//!
//! - **Resources are explicit**: every resource is created and destroyed
//!   through configuration calls, never implicitly.
//! - **Accounting is deterministic and testable**: wait queues are ordered,
//!   waiter selection is a pure function of queue contents and policy.
//! - **Invalid configuration is a no-op**: duplicate names, empty names,
//!   and removal of busy resources are silently refused.
//!
//! ## Core Concepts
//!
//! - [`ResourceTable`]: insertion-ordered table of named resources
//! - Each resource has at most one owner and an ordered wait queue
//! - [`ResourcePolicy`]: how the next waiter is chosen on release
//!   (FIFO head, or lowest numeric priority value with stable ties)

use core_types::Pid;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Waiter-selection policy applied when a resource is released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourcePolicy {
    /// Hand the resource to the head of the wait queue
    Fifo,
    /// Hand the resource to the waiter with the lowest numeric priority
    /// value, ties broken by queue position
    Priority,
}

impl fmt::Display for ResourcePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourcePolicy::Fifo => "FIFO",
            ResourcePolicy::Priority => "Priority",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ResourcePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FIFO" => Ok(ResourcePolicy::Fifo),
            "Priority" => Ok(ResourcePolicy::Priority),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

/// Error produced when parsing a [`ResourcePolicy`] from text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown resource policy: {0}")]
pub struct ParsePolicyError(pub String);

/// One named resource: owner, policy, and ordered wait queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceEntry {
    pub name: String,
    pub owner: Option<Pid>,
    pub policy: ResourcePolicy,
    pub waiters: VecDeque<Pid>,
}

impl ResourceEntry {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: None,
            policy: ResourcePolicy::Fifo,
            waiters: VecDeque::new(),
        }
    }
}

/// Insertion-ordered table of resources
///
/// Insertion order is observable: random resource plans index into the
/// list of defined names, so the table never reorders entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceTable {
    entries: Vec<ResourceEntry>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Table with the three predefined resources R1, R2, R3
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.add("R1");
        table.add("R2");
        table.add("R3");
        table
    }

    fn entry(&self, name: &str) -> Option<&ResourceEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    fn entry_mut(&mut self, name: &str) -> Option<&mut ResourceEntry> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    /// Adds a resource; refused (returns false) for empty or duplicate names
    pub fn add(&mut self, name: &str) -> bool {
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.entries.push(ResourceEntry::new(name));
        true
    }

    /// Removes a resource; refused while it is owned or has waiters
    pub fn remove(&mut self, name: &str) -> bool {
        let busy = match self.entry(name) {
            Some(entry) => entry.owner.is_some() || !entry.waiters.is_empty(),
            None => return false,
        };
        if busy {
            return false;
        }
        self.entries.retain(|e| e.name != name);
        true
    }

    /// Changes the waiter-selection policy; existing queue order is kept
    pub fn set_policy(&mut self, name: &str, policy: ResourcePolicy) -> bool {
        match self.entry_mut(name) {
            Some(entry) => {
                entry.policy = policy;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    pub fn owner(&self, name: &str) -> Option<Pid> {
        self.entry(name).and_then(|e| e.owner)
    }

    pub fn set_owner(&mut self, name: &str, pid: Pid) {
        if let Some(entry) = self.entry_mut(name) {
            entry.owner = Some(pid);
        }
    }

    pub fn clear_owner(&mut self, name: &str) {
        if let Some(entry) = self.entry_mut(name) {
            entry.owner = None;
        }
    }

    /// Defined resource names in insertion order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ResourceEntry] {
        &self.entries
    }

    pub fn waiters(&self, name: &str) -> Option<&VecDeque<Pid>> {
        self.entry(name).map(|e| &e.waiters)
    }

    /// Appends a waiter unless it is already queued; returns true when the
    /// waiter was newly inserted
    pub fn enqueue_waiter(&mut self, name: &str, pid: Pid) -> bool {
        match self.entry_mut(name) {
            Some(entry) => {
                if entry.waiters.contains(&pid) {
                    false
                } else {
                    entry.waiters.push_back(pid);
                    true
                }
            }
            None => false,
        }
    }

    /// Drops a waiter from one resource's queue
    pub fn remove_waiter(&mut self, name: &str, pid: Pid) {
        if let Some(entry) = self.entry_mut(name) {
            entry.waiters.retain(|&p| p != pid);
        }
    }

    /// Drops a process from every wait queue (used on forced termination)
    pub fn purge_waiter(&mut self, pid: Pid) {
        for entry in &mut self.entries {
            entry.waiters.retain(|&p| p != pid);
        }
    }

    /// Removes and returns the next waiter according to the resource's
    /// policy
    ///
    /// `priority_of` resolves a waiting process to its numeric priority;
    /// waiters it cannot resolve sort last. Ties keep queue order.
    pub fn choose_next_waiter<F>(&mut self, name: &str, priority_of: F) -> Option<Pid>
    where
        F: Fn(Pid) -> Option<u32>,
    {
        let entry = self.entry_mut(name)?;
        if entry.waiters.is_empty() {
            return None;
        }
        match entry.policy {
            ResourcePolicy::Fifo => entry.waiters.pop_front(),
            ResourcePolicy::Priority => {
                let mut best_index = 0;
                let mut best_priority = u32::MAX;
                for (index, &pid) in entry.waiters.iter().enumerate() {
                    let priority = priority_of(pid).unwrap_or(u32::MAX);
                    if priority < best_priority {
                        best_priority = priority;
                        best_index = index;
                    }
                }
                entry.waiters.remove(best_index)
            }
        }
    }
}
