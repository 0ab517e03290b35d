//! # Scheduler Console
//!
//! Runs a scheduling scenario from the command line and prints the event
//! log and the resulting metrics.

use rand::rngs::StdRng;
use rand::SeedableRng;
use sim_engine::{
    apply_preset, compute_metrics, generate_random, step, AlgoStats, PresetKey, SimSnapshot,
};
use std::env;
use std::process;

struct CliConfig {
    preset: Option<PresetKey>,
    random: bool,
    ticks: u64,
    quantum: u64,
    seed: u64,
    json: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            preset: None,
            random: false,
            ticks: 40,
            quantum: 3,
            seed: 42,
            json: false,
        }
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let config = parse_args(&args).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        print_usage(&args[0]);
        process::exit(1);
    });

    run(&config);
}

fn run(config: &CliConfig) {
    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut state = match config.preset {
        Some(key) => apply_preset(key),
        None => SimSnapshot::initial(),
    };
    if config.random {
        state = generate_random(&state, &mut rng);
    }

    for _ in 0..config.ticks {
        state = step(&state, config.quantum, &mut rng);
    }

    if config.json {
        match serde_json::to_string_pretty(&state) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize state: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    for line in state.log_lines() {
        println!("{}", line);
    }
    println!();
    print_metrics(&state);
}

fn print_metrics(state: &SimSnapshot) {
    let report = compute_metrics(state);

    println!("CPU utilization: {:.1}%", report.cpu_util);
    println!(
        "Finished: {}/{}",
        report.overall.finished, report.overall.total
    );
    print_algo("RR", &report.rr);
    print_algo("Priority", &report.priority);
    print_algo("FCFS", &report.fcfs);
    println!(
        "Overall: avg waiting {:.2}, avg turnaround {:.2}, avg weighted {:.2}",
        report.overall.avg_waiting, report.overall.avg_turnaround, report.overall.avg_weighted
    );
    println!(
        "Totals: waiting {}, turnaround {}",
        report.totals.waiting, report.totals.turnaround
    );
}

fn print_algo(label: &str, stats: &AlgoStats) {
    if stats.rows.is_empty() {
        return;
    }
    println!(
        "{}: {} finished, avg waiting {:.2}, avg turnaround {:.2}, avg weighted {:.2}",
        label,
        stats.rows.len(),
        stats.avg_waiting,
        stats.avg_turnaround,
        stats.avg_weighted
    );
    for row in &stats.rows {
        println!(
            "  {} arrival={} burst={} start={} end={} waiting={} turnaround={}",
            row.name,
            row.arrival,
            row.burst,
            row.start_tick.map_or("-".to_string(), |t| t.to_string()),
            row.end_tick.map_or("-".to_string(), |t| t.to_string()),
            row.waiting,
            row.turnaround
        );
    }
}

fn parse_args(args: &[String]) -> Result<CliConfig, String> {
    let mut config = CliConfig::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--preset" | "-p" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --preset".to_string());
                }
                let key = args[i]
                    .parse::<PresetKey>()
                    .map_err(|e| e.to_string())?;
                config.preset = Some(key);
            }
            "--random" => {
                config.random = true;
            }
            "--ticks" | "-t" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --ticks".to_string());
                }
                config.ticks = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid ticks value: {}", args[i]))?;
            }
            "--quantum" | "-q" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --quantum".to_string());
                }
                config.quantum = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid quantum value: {}", args[i]))?;
            }
            "--seed" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --seed".to_string());
                }
                config.seed = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid seed value: {}", args[i]))?;
            }
            "--json" => {
                config.json = true;
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other => {
                return Err(format!("Unknown option: {}", other));
            }
        }
        i += 1;
    }

    if config.preset.is_none() && !config.random {
        return Err("Nothing to run: pass --preset <KEY> or --random".to_string());
    }

    Ok(config)
}

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -p, --preset <KEY>   Scenario: deadlock, no-deadlock, heavy-io,");
    eprintln!("                       starvation, mixed");
    eprintln!("      --random         Append 10 randomly generated processes");
    eprintln!("  -t, --ticks <N>      Ticks to simulate (default 40)");
    eprintln!("  -q, --quantum <N>    Round-robin quantum for Q0 (default 3)");
    eprintln!("      --seed <N>       Random seed (default 42)");
    eprintln!("      --json           Print the final state as JSON instead");
    eprintln!("  -h, --help           Show this help message");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  {} --preset deadlock --ticks 20", program);
    eprintln!("  {} --random --seed 7 --json", program);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(rest: &[&str]) -> Vec<String> {
        std::iter::once("cli_console")
            .chain(rest.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn test_parse_preset_and_numbers() {
        let config = parse_args(&args(&[
            "--preset", "heavy-io", "--ticks", "12", "--quantum", "2", "--seed", "9",
        ]))
        .unwrap();
        assert_eq!(config.preset, Some(PresetKey::HeavyIo));
        assert_eq!(config.ticks, 12);
        assert_eq!(config.quantum, 2);
        assert_eq!(config.seed, 9);
        assert!(!config.json);
    }

    #[test]
    fn test_parse_requires_a_workload() {
        assert!(parse_args(&args(&["--ticks", "5"])).is_err());
        assert!(parse_args(&args(&["--random"])).is_ok());
    }

    #[test]
    fn test_parse_rejects_unknown_preset_and_option() {
        assert!(parse_args(&args(&["--preset", "livelock"])).is_err());
        assert!(parse_args(&args(&["--frobnicate"])).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_values() {
        assert!(parse_args(&args(&["--preset"])).is_err());
        assert!(parse_args(&args(&["--preset", "mixed", "--ticks"])).is_err());
    }
}
