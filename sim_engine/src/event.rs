//! Structured event log
//!
//! Events are tagged variants with structured fields; the textual
//! `t=<tick>: <message>` form consumed by log viewers is a `Display`
//! projection, so engine logic never parses its own log.

use core_types::{AlgoKey, Pid, QueueLevel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEventKind {
    /// Process admitted into its initial ready queue
    Arrived { name: String, level: QueueLevel },
    /// Aging counter reached the threshold, process moved one level up
    AgingPromotion { name: String, to: QueueLevel },
    /// I/O block expired, process back to ready
    IoComplete { name: String },
    /// Running process entered an I/O block
    IoBegin { name: String, block_len: u64 },
    /// Resource granted to the running process
    Allocated { name: String, resource: String },
    /// Process queued behind a resource owner
    Waiting {
        name: String,
        resource: String,
        owner: Pid,
    },
    /// Ownership cleared on finish or termination
    Released { name: String, resource: String },
    /// Waiter received ownership and returned to ready
    Resumed { name: String, resource: String },
    /// Q1 process displaced by a strictly higher-priority waiter
    Preempted { name: String },
    /// Q0 quantum exhausted, process demoted to Q1
    Demoted { name: String },
    /// Burst complete
    Finished { name: String, via: AlgoKey },
    /// Wait-for graph cycle found
    CycleDetected { cycle: Vec<Pid> },
    /// Victim chosen for forced termination
    VictimTerminated {
        name: String,
        priority: u32,
        arrival: u64,
    },
    /// No cycle remains after victim termination
    DeadlockResolved,
    /// Recomputed cycle identical to the previous one
    CycleStuck,
    /// Resolution iteration cap reached
    ResolutionAborted,
    /// Cycle members could not be resolved to live processes
    NoValidVictim { cycle: Vec<Pid> },
}

/// One log entry: the tick it belongs to plus the structured kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    pub kind: SimEventKind,
}

impl SimEvent {
    pub fn new(tick: u64, kind: SimEventKind) -> Self {
        Self { tick, kind }
    }
}

fn join_pids(pids: &[Pid], separator: &str) -> String {
    pids.iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}: ", self.tick)?;
        match &self.kind {
            SimEventKind::Arrived { name, level } => {
                write!(f, "{} arrived → {}", name, level)
            }
            SimEventKind::AgingPromotion { name, to } => {
                write!(f, "Aging promotion → {} to {}", name, to)
            }
            SimEventKind::IoComplete { name } => {
                write!(f, "{} I/O complete, ready", name)
            }
            SimEventKind::IoBegin { name, block_len } => {
                write!(f, "{} begins I/O (blocks for {})", name, block_len)
            }
            SimEventKind::Allocated { name, resource } => {
                write!(f, "{} allocated {}", name, resource)
            }
            SimEventKind::Waiting {
                name,
                resource,
                owner,
            } => {
                write!(f, "{} waiting for {} (owned by P{})", name, resource, owner)
            }
            SimEventKind::Released { name, resource } => {
                write!(f, "{} released {}", name, resource)
            }
            SimEventKind::Resumed { name, resource } => {
                write!(f, "{} resumed (acquired {})", name, resource)
            }
            SimEventKind::Preempted { name } => {
                write!(f, "Preempt {} (higher priority arrived)", name)
            }
            SimEventKind::Demoted { name } => {
                write!(f, "{} demoted to Q1 (quantum exhausted)", name)
            }
            SimEventKind::Finished { name, via } => {
                write!(f, "{} finished (via {})", name, via)
            }
            SimEventKind::CycleDetected { cycle } => {
                write!(f, "Deadlock cycle detected: [{}]", join_pids(cycle, " → "))
            }
            SimEventKind::VictimTerminated {
                name,
                priority,
                arrival,
            } => {
                write!(
                    f,
                    "Terminating victim {} (priority={}, arrival={})",
                    name, priority, arrival
                )
            }
            SimEventKind::DeadlockResolved => {
                write!(f, "Deadlock resolved successfully")
            }
            SimEventKind::CycleStuck => {
                write!(f, "Warning: Cycle unchanged after victim termination")
            }
            SimEventKind::ResolutionAborted => {
                write!(f, "Deadlock resolution aborted - too many iterations")
            }
            SimEventKind::NoValidVictim { cycle } => {
                write!(f, "No valid victim found in cycle: [{}]", join_pids(cycle, ", "))
            }
        }
    }
}
