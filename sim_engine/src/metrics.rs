//! Derived statistics over a snapshot
//!
//! Pure read-only projection: calling it twice on the same snapshot
//! yields identical results. Waiting time can be negative for processes
//! terminated early by deadlock resolution, so waiting is signed.

use crate::snapshot::SimSnapshot;
use core_types::{AlgoKey, Pid, ProcState, ProcessType};
use serde::{Deserialize, Serialize};

/// Per-finished-process statistics row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: Pid,
    pub name: String,
    pub arrival: u64,
    pub burst: u64,
    pub priority: u32,
    pub kind: ProcessType,
    pub start_tick: Option<u64>,
    pub end_tick: Option<u64>,
    pub waiting: i64,
    pub turnaround: u64,
    pub weighted_turnaround: f64,
    pub finished_by: Option<AlgoKey>,
}

/// Averages for one terminating-algorithm group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgoStats {
    pub rows: Vec<ProcessRecord>,
    pub avg_waiting: f64,
    pub avg_turnaround: f64,
    pub avg_weighted: f64,
}

/// Averages across every finished process
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverallStats {
    pub avg_waiting: f64,
    pub avg_turnaround: f64,
    pub avg_weighted: f64,
    pub finished: usize,
    pub total: usize,
}

/// Plain sums, for the totals row of result tables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub waiting: i64,
    pub turnaround: u64,
}

/// Full metrics report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub cpu_util: f64,
    pub rr: AlgoStats,
    pub priority: AlgoStats,
    pub fcfs: AlgoStats,
    pub overall: OverallStats,
    pub totals: Totals,
}

fn avg(values: impl Iterator<Item = f64>) -> f64 {
    let collected: Vec<f64> = values.collect();
    if collected.is_empty() {
        0.0
    } else {
        collected.iter().sum::<f64>() / collected.len() as f64
    }
}

fn group(records: &[ProcessRecord], algo: AlgoKey) -> AlgoStats {
    let rows: Vec<ProcessRecord> = records
        .iter()
        .filter(|r| r.finished_by == Some(algo))
        .cloned()
        .collect();
    AlgoStats {
        avg_waiting: avg(rows.iter().map(|r| r.waiting as f64)),
        avg_turnaround: avg(rows.iter().map(|r| r.turnaround as f64)),
        avg_weighted: avg(rows.iter().map(|r| r.weighted_turnaround)),
        rows,
    }
}

/// Computes waiting/turnaround/weighted-turnaround per finished process,
/// per-algorithm and overall averages, and CPU utilization
pub fn compute_metrics(state: &SimSnapshot) -> MetricsReport {
    let busy_ticks = state.timeline.iter().filter(|t| t.pid.is_some()).count();
    let cpu_util = if state.time > 0 {
        busy_ticks as f64 / state.time as f64 * 100.0
    } else {
        0.0
    };

    let records: Vec<ProcessRecord> = state
        .processes
        .iter()
        .filter(|p| p.state == ProcState::Finished)
        .map(|p| {
            let end = p.end_tick.unwrap_or(state.time);
            let turnaround = end.saturating_sub(p.arrival);
            ProcessRecord {
                id: p.id,
                name: p.name.clone(),
                arrival: p.arrival,
                burst: p.burst,
                priority: p.priority,
                kind: p.kind,
                start_tick: p.start_tick,
                end_tick: p.end_tick,
                waiting: turnaround as i64 - p.burst as i64,
                turnaround,
                weighted_turnaround: if p.burst > 0 {
                    turnaround as f64 / p.burst as f64
                } else {
                    0.0
                },
                finished_by: p.finished_by,
            }
        })
        .collect();

    let overall = OverallStats {
        avg_waiting: avg(records.iter().map(|r| r.waiting as f64)),
        avg_turnaround: avg(records.iter().map(|r| r.turnaround as f64)),
        avg_weighted: avg(records.iter().map(|r| r.weighted_turnaround)),
        finished: records.len(),
        total: state.processes.len(),
    };
    let totals = Totals {
        waiting: records.iter().map(|r| r.waiting).sum(),
        turnaround: records.iter().map(|r| r.turnaround).sum(),
    };

    MetricsReport {
        cpu_util,
        rr: group(&records, AlgoKey::RoundRobin),
        priority: group(&records, AlgoKey::Priority),
        fcfs: group(&records, AlgoKey::Fcfs),
        overall,
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessSpec;
    use crate::snapshot::TimelineSlot;
    use core_types::QueueLevel;

    #[test]
    fn test_empty_state_yields_zeroes() {
        let report = compute_metrics(&SimSnapshot::initial());
        assert_eq!(report.cpu_util, 0.0);
        assert_eq!(report.overall.finished, 0);
        assert_eq!(report.overall.avg_waiting, 0.0);
        assert_eq!(report.totals.turnaround, 0);
    }

    #[test]
    fn test_cpu_utilization_counts_busy_ticks() {
        let mut state = SimSnapshot::initial();
        state.time = 10;
        for tick in 0..10 {
            let busy = tick < 7;
            state.timeline.push(TimelineSlot {
                tick,
                pid: busy.then(|| Pid::new(1)),
                queue: busy.then_some(QueueLevel::Q0),
            });
        }
        let report = compute_metrics(&state);
        assert_eq!(report.cpu_util, 70.0);
    }

    #[test]
    fn test_record_round_trip_identities() {
        let mut state = SimSnapshot::initial();
        let pid = state.push_process(ProcessSpec {
            name: "A".to_string(),
            burst: 4,
            arrival: 2,
            priority: 1,
            kind: ProcessType::Important,
            resources: vec![],
        });
        {
            let p = state.process_mut(pid).unwrap();
            p.state = ProcState::Finished;
            p.end_tick = Some(9);
            p.finished_by = Some(AlgoKey::Priority);
        }
        state.time = 9;

        let report = compute_metrics(&state);
        let row = &report.priority.rows[0];
        assert_eq!(row.turnaround, 7);
        assert_eq!(row.waiting, row.turnaround as i64 - row.burst as i64);
        assert_eq!(row.weighted_turnaround, 7.0 / 4.0);
        assert_eq!(report.overall.finished, 1);
        assert_eq!(report.overall.total, 1);
    }

    #[test]
    fn test_zero_burst_weighted_turnaround_is_zero() {
        let mut state = SimSnapshot::initial();
        let pid = state.push_process(ProcessSpec {
            name: "Z".to_string(),
            burst: 0,
            arrival: 0,
            priority: 0,
            kind: ProcessType::Batch,
            resources: vec![],
        });
        {
            let p = state.process_mut(pid).unwrap();
            p.state = ProcState::Finished;
            p.end_tick = Some(3);
            p.finished_by = Some(AlgoKey::Fcfs);
        }
        state.time = 3;
        let report = compute_metrics(&state);
        assert_eq!(report.fcfs.rows[0].weighted_turnaround, 0.0);
    }

    #[test]
    fn test_metrics_are_idempotent() {
        let mut state = SimSnapshot::initial();
        state.time = 4;
        state.timeline.push(TimelineSlot {
            tick: 0,
            pid: Some(Pid::new(1)),
            queue: Some(QueueLevel::Q1),
        });
        assert_eq!(compute_metrics(&state), compute_metrics(&state));
    }
}
