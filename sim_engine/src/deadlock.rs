//! Wait-for graph and deadlock resolution
//!
//! An edge `A -> B` means process A is blocked on a resource currently
//! owned by B. Cycle detection is a depth-first traversal driven by an
//! explicit `(node, neighbor-index)` frame stack, so the in-progress set
//! and the extracted path are plain index operations with no recursion.
//! The reported cycle is the path slice from the first repeated node to
//! the back edge; victim selection depends on exactly this shape.

use crate::snapshot::SimSnapshot;
use crate::SimEventKind;
use core_types::{Pid, ProcState};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Resolution gives up after this many victim terminations
const MAX_RESOLUTION_ROUNDS: usize = 20;

/// Adjacency map from a blocked process to the owners it waits on
///
/// Keys iterate in ascending pid order, which keeps traversal order (and
/// therefore the reported cycle) deterministic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WaitForGraph {
    edges: BTreeMap<Pid, Vec<Pid>>,
}

impl WaitForGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `from -> to`; duplicates are ignored
    pub fn add_edge(&mut self, from: Pid, to: Pid) {
        let targets = self.edges.entry(from).or_default();
        if !targets.contains(&to) {
            targets.push(to);
        }
    }

    /// Drops every outgoing edge of `pid` (it acquired a resource)
    pub fn remove_outgoing(&mut self, pid: Pid) {
        self.edges.remove(&pid);
    }

    /// Drops every edge to or from `pid` (it finished or was terminated)
    pub fn remove_node(&mut self, pid: Pid) {
        self.edges.remove(&pid);
        self.edges.retain(|_, targets| {
            targets.retain(|&t| t != pid);
            !targets.is_empty()
        });
    }

    /// Rewrites the single outgoing edge of a waiter after the resource it
    /// waits on changed owner
    pub fn retarget(&mut self, waiter: Pid, new_owner: Pid) {
        self.edges.remove(&waiter);
        self.add_edge(waiter, new_owner);
    }

    pub fn neighbors(&self, pid: Pid) -> &[Pid] {
        self.edges.get(&pid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nodes(&self) -> impl Iterator<Item = Pid> + '_ {
        self.edges.keys().copied()
    }

    pub fn edges(&self) -> &BTreeMap<Pid, Vec<Pid>> {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Finds the first reachable cycle, or an empty list if the graph is
/// acyclic
///
/// Returns the ordered pids from the first repeated node to the point of
/// the back edge.
pub fn detect_cycle(graph: &WaitForGraph) -> Vec<Pid> {
    let mut visited: BTreeSet<Pid> = BTreeSet::new();

    for start in graph.nodes() {
        if visited.contains(&start) {
            continue;
        }

        let mut frames: Vec<(Pid, usize)> = vec![(start, 0)];
        let mut on_stack: BTreeSet<Pid> = BTreeSet::new();
        let mut path: Vec<Pid> = vec![start];
        visited.insert(start);
        on_stack.insert(start);

        while let Some(frame) = frames.last_mut() {
            let node = frame.0;
            let neighbors = graph.neighbors(node);
            if frame.1 < neighbors.len() {
                let next = neighbors[frame.1];
                frame.1 += 1;
                if !visited.contains(&next) {
                    visited.insert(next);
                    on_stack.insert(next);
                    path.push(next);
                    frames.push((next, 0));
                } else if on_stack.contains(&next) {
                    if let Some(pos) = path.iter().position(|&p| p == next) {
                        return path[pos..].to_vec();
                    }
                }
            } else {
                on_stack.remove(&node);
                path.pop();
                frames.pop();
            }
        }
    }

    Vec::new()
}

/// Picks the cycle member to terminate: highest numeric priority value
/// loses, ties broken by latest arrival, then by highest id
pub(crate) fn pick_victim(state: &SimSnapshot, cycle: &[Pid]) -> Option<Pid> {
    let mut candidates: Vec<(u32, u64, Pid)> = cycle
        .iter()
        .filter_map(|&pid| {
            state
                .process(pid)
                .map(|p| (p.priority, p.arrival, p.id))
        })
        .collect();
    candidates.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)).then(b.2.cmp(&a.2)));
    candidates.first().map(|&(_, _, pid)| pid)
}

/// Repeatedly terminates victims until no cycle remains
///
/// Halts with a logged warning when the iteration cap is hit or when a
/// recomputed cycle is identical to the previous one; any residual cycle
/// stays visible in state.
pub(crate) fn resolve_in_place(state: &mut SimSnapshot) {
    let mut rounds = 0;
    while !state.cycle.is_empty() && rounds < MAX_RESOLUTION_ROUNDS {
        let victim = match pick_victim(state, &state.cycle) {
            Some(pid) => pid,
            None => {
                let cycle = state.cycle.clone();
                state.push_event(SimEventKind::NoValidVictim { cycle });
                break;
            }
        };

        state.push_event(SimEventKind::CycleDetected {
            cycle: state.cycle.clone(),
        });
        if let Some(p) = state.process(victim) {
            state.push_event(SimEventKind::VictimTerminated {
                name: p.name.clone(),
                priority: p.priority,
                arrival: p.arrival,
            });
        }

        terminate_victim(state, victim);

        let previous = std::mem::take(&mut state.cycle);
        state.cycle = detect_cycle(&state.wait_for);

        if state.cycle.is_empty() {
            state.push_event(SimEventKind::DeadlockResolved);
        } else if state.cycle == previous {
            state.push_event(SimEventKind::CycleStuck);
            break;
        }

        rounds += 1;
    }

    if rounds >= MAX_RESOLUTION_ROUNDS {
        state.push_event(SimEventKind::ResolutionAborted);
    }
}

/// Runs deadlock resolution on demand
///
/// A no-op clone when no cycle is recorded; otherwise victims are
/// terminated until the graph is acyclic or resolution gives up.
pub fn resolve_deadlock(prev: &SimSnapshot) -> SimSnapshot {
    let mut state = prev.clone();
    if !state.cycle.is_empty() {
        resolve_in_place(&mut state);
    }
    state
}

/// Forced termination: like a normal completion except the remaining burst
/// is discarded and no burst unit is consumed
fn terminate_victim(state: &mut SimSnapshot, pid: Pid) {
    let time = state.time;
    if let Some(p) = state.process_mut(pid) {
        p.state = ProcState::Finished;
        p.end_tick = Some(time);
        p.finished_by = Some(p.queue_level.algo());
        p.remaining = 0;
        p.blocked_reason = None;
    } else {
        return;
    }
    state.finished_order.push(pid);
    state.release_all(pid);
    state.wait_for.remove_node(pid);
    state.resources.purge_waiter(pid);
    state.queues.remove_everywhere(pid);
    if state.current == Some(pid) {
        state.current = None;
        state.rr_slice = 0;
    }
}
