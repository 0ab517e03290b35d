//! Simulation snapshot and configuration operations
//!
//! The snapshot is the only state there is: the engine keeps nothing
//! between calls. Every operation takes a snapshot by reference and hands
//! back a new one; the input is never mutated.

use crate::deadlock::WaitForGraph;
use crate::event::{SimEvent, SimEventKind};
use crate::process::{Process, ProcessSpec};
use crate::queues::ReadyQueues;
use core_types::{BlockedReason, Pid, ProcState, QueueLevel};
use resources::{ResourcePolicy, ResourceTable};
use serde::{Deserialize, Serialize};

/// Aging promoter configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgingSettings {
    pub enabled: bool,
    pub threshold: u64,
}

/// I/O simulator configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IoSettings {
    pub enabled: bool,
    pub block_length: u64,
}

/// Deadlock resolver configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeadlockSettings {
    pub auto_resolve: bool,
}

/// Engine configuration carried in the snapshot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    pub aging: AgingSettings,
    pub io: IoSettings,
    pub deadlock: DeadlockSettings,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            aging: AgingSettings {
                enabled: false,
                threshold: 10,
            },
            io: IoSettings {
                enabled: false,
                block_length: 3,
            },
            deadlock: DeadlockSettings { auto_resolve: true },
        }
    }
}

/// One tick of the flat execution timeline; `pid` is empty on idle ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSlot {
    pub tick: u64,
    pub pid: Option<Pid>,
    pub queue: Option<QueueLevel>,
}

/// Complete simulation state
///
/// Queues hold pids, processes live in one flat collection, and the pid
/// counter travels with the state so id assignment is replayable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub time: u64,
    pub processes: Vec<Process>,
    pub finished_order: Vec<Pid>,
    pub current: Option<Pid>,
    pub queues: ReadyQueues,
    pub rr_slice: u64,
    pub timeline: Vec<TimelineSlot>,
    pub resources: ResourceTable,
    pub wait_for: WaitForGraph,
    pub cycle: Vec<Pid>,
    pub log: Vec<SimEvent>,
    pub config: SchedulerSettings,
    pub next_pid: u64,
}

impl SimSnapshot {
    /// Empty state: resources R1/R2/R3, default configuration, pid
    /// counter at 1
    pub fn initial() -> Self {
        Self {
            time: 0,
            processes: Vec::new(),
            finished_order: Vec::new(),
            current: None,
            queues: ReadyQueues::new(),
            rr_slice: 0,
            timeline: Vec::new(),
            resources: ResourceTable::with_defaults(),
            wait_for: WaitForGraph::new(),
            cycle: Vec::new(),
            log: Vec::new(),
            config: SchedulerSettings::default(),
            next_pid: 1,
        }
    }

    /// Fresh empty state; the pid counter restarts
    pub fn reset(&self) -> Self {
        Self::initial()
    }

    pub fn process(&self, pid: Pid) -> Option<&Process> {
        self.processes.iter().find(|p| p.id == pid)
    }

    pub fn process_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.processes.iter_mut().find(|p| p.id == pid)
    }

    pub fn priority_of(&self, pid: Pid) -> Option<u32> {
        self.process(pid).map(|p| p.priority)
    }

    /// Rendered `t=<tick>: <message>` log lines
    pub fn log_lines(&self) -> Vec<String> {
        self.log.iter().map(|e| e.to_string()).collect()
    }

    /// Appends one new process built from `spec`
    pub fn add_process(&self, spec: ProcessSpec) -> Self {
        let mut state = self.clone();
        state.push_process(spec);
        state
    }

    /// Clamped configuration update (threshold and block length floored
    /// at 1)
    pub fn apply_settings(&self, settings: SchedulerSettings) -> Self {
        let mut state = self.clone();
        state.config = settings;
        state.config.aging.threshold = state.config.aging.threshold.max(1);
        state.config.io.block_length = state.config.io.block_length.max(1);
        state
    }

    /// Adds a resource; duplicate or empty names are a silent no-op
    pub fn add_resource(&self, name: &str) -> Self {
        let mut state = self.clone();
        state.resources.add(name);
        state
    }

    /// Removes a resource; refused silently while owned or waited on
    pub fn remove_resource(&self, name: &str) -> Self {
        let mut state = self.clone();
        state.resources.remove(name);
        state
    }

    /// Changes a waiter-selection policy; unknown names are a silent no-op
    pub fn set_resource_policy(&self, name: &str, policy: ResourcePolicy) -> Self {
        let mut state = self.clone();
        state.resources.set_policy(name, policy);
        state
    }

    /// Draws the next pid and appends the process (internal, mutating)
    pub(crate) fn push_process(&mut self, spec: ProcessSpec) -> Pid {
        let pid = Pid::new(self.next_pid);
        self.next_pid += 1;
        self.processes.push(Process::from_spec(pid, spec));
        pid
    }

    pub(crate) fn push_event(&mut self, kind: SimEventKind) {
        let tick = self.time;
        self.log.push(SimEvent::new(tick, kind));
    }

    pub(crate) fn push_event_at(&mut self, tick: u64, kind: SimEventKind) {
        self.log.push(SimEvent::new(tick, kind));
    }

    /// Re-enqueues a ready process at the tail of its current queue level
    pub(crate) fn enqueue_ready(&mut self, pid: Pid) {
        if let Some(level) = self.process(pid).map(|p| p.queue_level) {
            self.queues.enqueue_if_absent(level, pid);
        }
    }

    /// Releases every resource `pid` owns and hands each to the next
    /// waiter chosen by that resource's policy
    ///
    /// A waiter that was blocked solely on the released resource returns
    /// to ready; the wait-for edges of the remaining waiters are
    /// retargeted at the new owner so each blocked process always points
    /// at the current owner of the resource it needs.
    pub(crate) fn release_all(&mut self, pid: Pid) {
        let (acquired, holder_name) = match self.process_mut(pid) {
            Some(p) => (std::mem::take(&mut p.acquired), p.name.clone()),
            None => return,
        };

        for resource in &acquired {
            if self.resources.owner(resource) != Some(pid) {
                continue;
            }
            self.resources.clear_owner(resource);
            self.push_event(SimEventKind::Released {
                name: holder_name.clone(),
                resource: resource.clone(),
            });

            let next = {
                let processes = &self.processes;
                self.resources.choose_next_waiter(resource, |waiter| {
                    processes
                        .iter()
                        .find(|p| p.id == waiter)
                        .map(|p| p.priority)
                })
            };
            let Some(next_pid) = next else { continue };

            self.resources.set_owner(resource, next_pid);
            self.wait_for.remove_outgoing(next_pid);
            let remaining: Vec<Pid> = self
                .resources
                .waiters(resource)
                .map(|q| q.iter().copied().collect())
                .unwrap_or_default();
            for waiter in remaining {
                self.wait_for.retarget(waiter, next_pid);
            }

            let mut resumed_name = None;
            if let Some(np) = self.process_mut(next_pid) {
                np.acquired.push(resource.clone());
                if np.state == ProcState::Blocked
                    && np.blocked_reason == Some(BlockedReason::Resource)
                {
                    np.blocked_reason = None;
                    np.state = ProcState::Ready;
                    resumed_name = Some(np.name.clone());
                }
            }
            if let Some(name) = resumed_name {
                self.enqueue_ready(next_pid);
                self.push_event(SimEventKind::Resumed {
                    name,
                    resource: resource.clone(),
                });
            }
        }
    }
}

impl Default for SimSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}
