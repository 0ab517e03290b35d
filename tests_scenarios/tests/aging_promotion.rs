//! Aging promotions across queue levels

use core_types::{Pid, ProcState, ProcessType, QueueLevel};
use sim_engine::{apply_preset, PresetKey, ProcessSpec, SimSnapshot};
use tests_scenarios::{log_contains, log_count, run_checked, seeded};

/// A foreground hog that keeps the CPU for the whole run and a background
/// batch process left to age in the queues
fn hog_and_background(threshold: u64) -> SimSnapshot {
    let start = SimSnapshot::initial()
        .add_process(ProcessSpec {
            name: "FG".to_string(),
            burst: 30,
            arrival: 0,
            priority: 2,
            kind: ProcessType::Interactive,
            resources: vec!["R3".to_string()],
        })
        .add_process(ProcessSpec {
            name: "BG".to_string(),
            burst: 3,
            arrival: 0,
            priority: 4,
            kind: ProcessType::Batch,
            resources: vec!["R1".to_string()],
        });
    let mut settings = start.config;
    settings.aging.enabled = true;
    settings.aging.threshold = threshold;
    start.apply_settings(settings)
}

#[test]
fn test_waiting_process_climbs_one_level_per_threshold() {
    // quantum 10 keeps FG on the CPU; BG waits and ages
    let state = run_checked(&hog_and_background(3), 8, 10, &mut seeded(1));

    assert!(log_contains(&state, "t=2: Aging promotion → BG to Q1"));
    assert!(log_contains(&state, "t=5: Aging promotion → BG to Q0"));
    assert_eq!(log_count(&state, "Aging promotion"), 2);

    let bg = state.process(Pid::new(2)).unwrap();
    assert_eq!(bg.state, ProcState::Ready);
    assert_eq!(bg.queue_level, QueueLevel::Q0);
    // the counter restarted after the second promotion
    assert_eq!(bg.age_wait, 2);
}

#[test]
fn test_q0_is_the_ceiling() {
    // long past two thresholds, BG must still sit in Q0
    let state = run_checked(&hog_and_background(3), 9, 30, &mut seeded(1));

    assert_eq!(log_count(&state, "Aging promotion"), 2);
    let bg = state.process(Pid::new(2)).unwrap();
    assert_eq!(bg.queue_level, QueueLevel::Q0);
    assert_eq!(bg.age_wait, 0);
}

#[test]
fn test_running_process_does_not_age() {
    let state = run_checked(&hog_and_background(3), 8, 10, &mut seeded(1));
    let fg = state.process(Pid::new(1)).unwrap();
    assert_eq!(fg.state, ProcState::Running);
    assert_eq!(fg.age_wait, 0);
}

#[test]
fn test_starvation_preset_never_promotes() {
    let state = run_checked(&apply_preset(PresetKey::Starvation), 30, 3, &mut seeded(3));

    assert!(!log_contains(&state, "Aging promotion"));
    let starved = state
        .processes
        .iter()
        .find(|p| p.name == "BatchStarve")
        .unwrap();
    assert_eq!(starved.queue_level, QueueLevel::Q2);
}
