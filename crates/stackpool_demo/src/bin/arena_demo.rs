//! # Arena Demo
//!
//! Runs the user pool scenario and the arena benchmark, then prints how much
//! memory reached the heap.
//!
//! ## Usage
//!
//! ```bash
//! arena_demo --config demo.toml --users 100 --rounds 50000
//! ```

use std::process::ExitCode;

use stackpool_demo::scenario::{BENCH_POOL_BYTES, USER_POOL_BYTES};
use stackpool_demo::{run_benchmark, run_scenario, CliArgs, DemoConfig};

fn print_usage() {
    println!("Usage: arena_demo [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>    TOML config file (default: built-in values)");
    println!("  -u, --users <COUNT>    Users in the pooled array (default: 10)");
    println!("  -r, --rounds <COUNT>   Benchmark allocate/release pairs (default: 10000)");
    println!("  -h, --help             Show this help");
}

fn main() -> ExitCode {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         STACKPOOL ARENA DEMO                                     ║");
    println!("║         OBJECTS IN STACK MEMORY                                  ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match CliArgs::parse(&args) {
        Ok(cli) => cli,
        Err(e) => {
            println!("Error: {e}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };
    if cli.help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let mut config = match cli.config_path {
        Some(path) => match DemoConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                println!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
        None => DemoConfig::default(),
    };
    if let Some(users) = cli.users {
        config.user_count = users;
    }
    if let Some(rounds) = cli.rounds {
        config.benchmark_rounds = rounds;
    }
    if let Err(e) = config.validate() {
        println!("Error: {e}");
        return ExitCode::FAILURE;
    }

    println!("┌─ CONFIG ───────────────────────────────────────────────────────┐");
    match toml::to_string(&config) {
        Ok(rendered) => {
            for line in rendered.lines() {
                println!("│ {line}");
            }
        }
        Err(e) => println!("│ (unprintable: {e})"),
    }
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let report = run_scenario(&config);
    println!("┌─ USER POOL ({USER_POOL_BYTES} bytes) ─────────────────────────────────────┐");
    println!("│ heap after single user:   {:>8} bytes", report.heap_after_single);
    println!("│ heap after {:>5} users:   {:>8} bytes", report.user_count, report.heap_after_array);
    println!("│ heap after boxed user:    {:>8} bytes", report.heap_after_boxed);
    println!("│ heap after plain i32:     {:>8} bytes", report.heap_after_plain);
    println!("│ pool peak used:           {:>8} bytes", report.pool_peak_used);
    println!("│ pool fallbacks:           {:>8}", report.pool.fallback_allocations);
    println!("│ pool stranded:            {:>8} bytes", report.pool.stranded_bytes);
    println!("│ heap live at exit:        {:>8} bytes", report.heap.live_bytes());
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let bench = run_benchmark(&config);
    println!("┌─ BENCHMARK ({BENCH_POOL_BYTES} byte pool) ───────────────────────────────────┐");
    println!("│ rounds x size:            {} x {} bytes", bench.rounds, bench.request_size);
    println!("│ arena:                    {:>8} us", bench.arena.as_micros());
    println!("│ system:                   {:>8} us", bench.system.as_micros());
    println!("│ arena fallbacks:          {:>8}", bench.arena_fallbacks);
    println!("└──────────────────────────────────────────────────────────────────┘");

    ExitCode::SUCCESS
}
