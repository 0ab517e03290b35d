//! Process model: identity plus mutable simulation state

use core_types::{AlgoKey, BlockedReason, Pid, ProcState, ProcessType, QueueLevel};
use serde::{Deserialize, Serialize};

/// One `(tick, queue)` execution sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecSample {
    pub tick: u64,
    pub queue: QueueLevel,
}

/// A simulated process
///
/// `required` is the ordered list of resources the process needs;
/// `acquired` is always a prefix of it. `history` records every tick the
/// process actually ran and at which queue level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub id: Pid,
    pub name: String,
    pub arrival: u64,
    pub burst: u64,
    pub remaining: u64,
    pub priority: u32,
    pub kind: ProcessType,
    pub state: ProcState,
    pub queue_level: QueueLevel,
    pub start_tick: Option<u64>,
    pub end_tick: Option<u64>,
    pub required: Vec<String>,
    pub acquired: Vec<String>,
    pub history: Vec<ExecSample>,
    pub finished_by: Option<AlgoKey>,
    pub age_wait: u64,
    pub blocked_reason: Option<BlockedReason>,
    pub io_block_remaining: u64,
    pub total_io_blocked: u64,
    /// Whether the randomized resource plan has been drawn; a roll that
    /// yields "no resources" is final and is never repeated
    pub plan_drawn: bool,
}

/// Parameters for creating one process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSpec {
    pub name: String,
    pub burst: u64,
    pub arrival: u64,
    pub priority: u32,
    pub kind: ProcessType,
    pub resources: Vec<String>,
}

impl Process {
    /// Builds a `new`-state process; an empty name defaults to `P<pid>`
    pub fn from_spec(pid: Pid, spec: ProcessSpec) -> Self {
        let name = if spec.name.is_empty() {
            format!("P{}", pid)
        } else {
            spec.name
        };
        Self {
            id: pid,
            name,
            arrival: spec.arrival,
            burst: spec.burst,
            remaining: spec.burst,
            priority: spec.priority,
            kind: spec.kind,
            state: ProcState::New,
            queue_level: spec.kind.initial_queue_level(),
            start_tick: None,
            end_tick: None,
            required: spec.resources,
            acquired: Vec::new(),
            history: Vec::new(),
            finished_by: None,
            age_wait: 0,
            blocked_reason: None,
            io_block_remaining: 0,
            total_io_blocked: 0,
            plan_drawn: false,
        }
    }

    /// The next required-but-unacquired resource, if any
    pub fn next_required(&self) -> Option<&str> {
        self.required.get(self.acquired.len()).map(String::as_str)
    }
}
