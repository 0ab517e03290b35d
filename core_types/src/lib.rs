//! # Core Types
//!
//! Fundamental vocabulary types for the MLFQ simulator.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: process identity, queue levels, and
//!   lifecycle states are dedicated types, not bare integers or strings.
//! - **Determinism first**: identifiers are monotonic counters carried in
//!   simulation state, never drawn from ambient global sources.
//! - **Type safety first**: a queue level cannot be confused with a
//!   priority, and a lifecycle state cannot be confused with a block
//!   reason.
//!
//! ## Key Types
//!
//! - [`Pid`]: monotonic process identifier
//! - [`ProcessType`]: workload class, determines initial queue level and
//!   I/O behavior
//! - [`QueueLevel`]: one of the three ready queues
//! - [`AlgoKey`]: the discipline a process finished under
//! - [`ProcState`] / [`BlockedReason`]: lifecycle state machine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unique identifier for a simulated process
///
/// Pids are assigned monotonically from a counter carried in the
/// simulation snapshot, so replaying the same operations yields the same
/// ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Pid(pub u64);

impl Pid {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Workload class of a simulated process
///
/// The class determines the queue a process is admitted into and how
/// likely it is to block on I/O after executing a burst unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessType {
    Interactive,
    Important,
    Batch,
}

impl ProcessType {
    /// Queue level a freshly admitted process of this class starts in
    pub fn initial_queue_level(&self) -> QueueLevel {
        match self {
            ProcessType::Interactive => QueueLevel::Q0,
            ProcessType::Important => QueueLevel::Q1,
            ProcessType::Batch => QueueLevel::Q2,
        }
    }

    /// Probability that one executed burst unit triggers an I/O block
    pub fn io_probability(&self) -> f64 {
        match self {
            ProcessType::Interactive => 0.2,
            ProcessType::Important => 0.1,
            ProcessType::Batch => 0.05,
        }
    }

    pub const ALL: [ProcessType; 3] = [
        ProcessType::Interactive,
        ProcessType::Important,
        ProcessType::Batch,
    ];
}

impl fmt::Display for ProcessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessType::Interactive => "Interactive",
            ProcessType::Important => "Important",
            ProcessType::Batch => "Batch",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ProcessType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Interactive" => Ok(ProcessType::Interactive),
            "Important" => Ok(ProcessType::Important),
            "Batch" => Ok(ProcessType::Batch),
            other => Err(ParseError::UnknownProcessType(other.to_string())),
        }
    }
}

/// One of the three ready queues
///
/// Q0 is round-robin, Q1 is preemptive priority, Q2 is FCFS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueueLevel {
    Q0,
    Q1,
    Q2,
}

impl QueueLevel {
    pub fn index(&self) -> u8 {
        match self {
            QueueLevel::Q0 => 0,
            QueueLevel::Q1 => 1,
            QueueLevel::Q2 => 2,
        }
    }

    /// The next level up, if any (Q0 is never promoted further)
    pub fn promoted(&self) -> Option<QueueLevel> {
        match self {
            QueueLevel::Q0 => None,
            QueueLevel::Q1 => Some(QueueLevel::Q0),
            QueueLevel::Q2 => Some(QueueLevel::Q1),
        }
    }

    /// The discipline that governs this level
    pub fn algo(&self) -> AlgoKey {
        match self {
            QueueLevel::Q0 => AlgoKey::RoundRobin,
            QueueLevel::Q1 => AlgoKey::Priority,
            QueueLevel::Q2 => AlgoKey::Fcfs,
        }
    }
}

impl fmt::Display for QueueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.index())
    }
}

/// Scheduling discipline tag recorded when a process finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlgoKey {
    RoundRobin,
    Priority,
    Fcfs,
}

impl fmt::Display for AlgoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlgoKey::RoundRobin => "RR",
            AlgoKey::Priority => "Priority",
            AlgoKey::Fcfs => "FCFS",
        };
        write!(f, "{}", name)
    }
}

/// Lifecycle state of a simulated process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcState {
    New,
    Ready,
    Running,
    Blocked,
    Finished,
}

/// Why a blocked process is blocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockedReason {
    Resource,
    Io,
}

/// Errors produced when parsing textual representations of core types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown process type: {0}")]
    UnknownProcessType(String),
}
