//! Q0 round-robin behavior over full runs

use core_types::{ProcessType, QueueLevel};
use sim_engine::{ProcessSpec, SimSnapshot};
use tests_scenarios::{log_contains, log_count, run_checked, seeded};

fn interactive(name: &str, burst: u64, resources: &[&str]) -> ProcessSpec {
    ProcessSpec {
        name: name.to_string(),
        burst,
        arrival: 0,
        priority: 2,
        kind: ProcessType::Interactive,
        resources: resources.iter().map(|r| r.to_string()).collect(),
    }
}

#[test]
fn test_quantum_exhaustion_demotes_to_q1() {
    let start = SimSnapshot::initial().add_process(interactive("A", 5, &["R1"]));
    let state = run_checked(&start, 5, 3, &mut seeded(1));

    assert!(log_contains(&state, "t=0: A arrived → Q0"));
    assert!(log_contains(&state, "t=0: A allocated R1"));
    assert!(log_contains(
        &state,
        "t=3: A demoted to Q1 (quantum exhausted)"
    ));
    assert_eq!(log_count(&state, "demoted"), 1);

    // three units at Q0, the last two at Q1
    let p = state.process(core_types::Pid::new(1)).unwrap();
    let levels: Vec<QueueLevel> = p.history.iter().map(|s| s.queue).collect();
    assert_eq!(
        levels,
        vec![
            QueueLevel::Q0,
            QueueLevel::Q0,
            QueueLevel::Q0,
            QueueLevel::Q1,
            QueueLevel::Q1
        ]
    );
}

#[test]
fn test_demoted_process_finishes_via_priority() {
    let start = SimSnapshot::initial().add_process(interactive("A", 5, &["R1"]));
    let state = run_checked(&start, 6, 3, &mut seeded(1));

    assert!(log_contains(&state, "t=4: A released R1"));
    assert!(log_contains(&state, "t=5: A finished (via Priority)"));
    let p = state.process(core_types::Pid::new(1)).unwrap();
    assert_eq!(p.end_tick, Some(5));
    assert_eq!(p.remaining, 0);
}

#[test]
fn test_finish_within_quantum_stays_round_robin() {
    let start = SimSnapshot::initial().add_process(interactive("A", 2, &["R1"]));
    let state = run_checked(&start, 3, 3, &mut seeded(1));

    assert!(log_contains(&state, "t=2: A finished (via RR)"));
    assert!(!log_contains(&state, "demoted"));
    let p = state.process(core_types::Pid::new(1)).unwrap();
    assert_eq!(p.queue_level, QueueLevel::Q0);
}
