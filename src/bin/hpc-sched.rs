//! Scheduler process entry point (§6): a thin driver that parses the
//! `nthreads` command line, builds an empty universe, and runs one
//! cycle when invoked with `--one-shot`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use clap::Parser;
use tracing::info;

use hpc_sched_core::calendar::Calendar;
use hpc_sched_core::config::Cli;
use hpc_sched_core::cycle::{run_main_loop, CycleLimits};
use hpc_sched_core::model::Universe;
use hpc_sched_core::policy::CyclePolicy;

fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    info!(nthreads = cli.nthreads, one_shot = cli.one_shot, "hpc-sched starting");

    let mut universe = Universe::new(0);
    let mut calendar = Calendar::new();
    let policy = CyclePolicy::default();
    let limits = CycleLimits::default();

    let (report, outbox) = run_main_loop(&mut universe, &mut calendar, &[], &[], limits, &policy);
    info!(jobs_checked = report.jobs_checked, jobs_run = report.jobs_run, requests = outbox.len(), "cycle complete");

    if cli.verbose > 0 {
        match serde_json::to_string(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => info!(error = %e, "failed to serialize cycle report"),
        }
    }

    if !cli.one_shot {
        info!("no server connection configured; exiting after one cycle");
    }
}
