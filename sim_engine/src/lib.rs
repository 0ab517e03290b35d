//! # Simulation Engine
//!
//! This crate implements a multi-level feedback queue scheduler with
//! resource allocation and deadlock handling, driven one tick at a time.
//!
//! ## Purpose
//!
//! The engine demonstrates how scheduling policies interact:
//! - Q0 runs round-robin with a configurable quantum
//! - Q1 runs preemptive priority (lower value wins)
//! - Q2 runs first-come-first-served
//! - Aging promotes long-waiting processes upward
//! - Exclusive resources build a wait-for graph; cycles are deadlocks
//!
//! ## Philosophy
//!
//! **Every operation is a pure snapshot-to-snapshot function.**
//!
//! The engine holds no state of its own. [`step`] takes a snapshot and a
//! random source and returns the snapshot one tick later; the input is
//! never touched. That makes every run replayable from a seed, every
//! intermediate state inspectable, and every test a plain equality check
//! on values.

pub mod deadlock;
pub mod event;
pub mod metrics;
pub mod presets;
pub mod process;
pub mod queues;
pub mod snapshot;
pub mod step;

pub use deadlock::{detect_cycle, resolve_deadlock, WaitForGraph};
pub use event::{SimEvent, SimEventKind};
pub use metrics::{compute_metrics, AlgoStats, MetricsReport, OverallStats, ProcessRecord, Totals};
pub use presets::{apply_preset, generate_random, ParsePresetError, PresetKey};
pub use process::{ExecSample, Process, ProcessSpec};
pub use queues::ReadyQueues;
pub use snapshot::{
    AgingSettings, DeadlockSettings, IoSettings, SchedulerSettings, SimSnapshot, TimelineSlot,
};
pub use step::step;
