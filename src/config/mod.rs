//! Configuration (§6: "Config files: external collaborators, interface
//! only"). The core never owns file I/O; a [`ConfigSource`] supplies the
//! parsed structs, and the process-level CLI is a `clap`-derived struct.

use chrono::NaiveDate;
use clap::Parser;

use crate::error::SchedResult;

/// Scheduler-config token file, parsed elsewhere.
#[derive(Debug, Clone, Default)]
pub struct SchedConfig {
    pub prime_time_policy_bits: u32,
    pub primary_sort_keys: Vec<String>,
    pub node_sort_keys: Vec<String>,
    pub dedicated_time_blocks: Vec<(i64, i64)>,
    /// Julian-day holiday list, in the PBS holidays-file's native
    /// day-of-year form.
    pub holidays: Vec<u32>,
    pub peer_queue_map: Vec<(String, String)>,
    pub dynamic_resource_scripts: Vec<String>,
    pub fairshare_resource: Option<String>,
    pub fairshare_decay_factor: f64,
}

impl SchedConfig {
    /// Resolves the configured holiday day-of-year list against a
    /// calendar year, for logging/diagnostics — the holidays file itself
    /// has no year, so the cycle driver supplies one from `server_time`.
    /// A day-of-year the year doesn't have (e.g. 366 in a non-leap year)
    /// is skipped rather than failing the whole list.
    pub fn holiday_dates(&self, year: i32) -> Vec<NaiveDate> {
        self.holidays.iter().filter_map(|&doy| NaiveDate::from_yo_opt(year, doy)).collect()
    }
}

/// PBS environment: paths, ports, auth/encryption method names.
#[derive(Debug, Clone, Default)]
pub struct PbsEnv {
    pub server_host: String,
    pub server_port: u16,
    pub auth_method: String,
    pub encrypt_method: Option<String>,
    pub allowed_auth_methods: Vec<String>,
    pub comm_hosts: Vec<String>,
}

/// Supplies parsed configuration without the core owning file I/O.
#[async_trait::async_trait]
pub trait ConfigSource: Send + Sync {
    async fn sched_config(&self) -> SchedResult<SchedConfig>;
    async fn pbs_env(&self) -> SchedResult<PbsEnv>;
}

/// Process command line (§6): bounds the worker pool and carries
/// test/debug flags.
#[derive(Parser, Debug, Clone)]
#[command(name = "hpc-sched", about = "HPC batch scheduler cycle engine")]
pub struct Cli {
    /// Worker pool size; 0 or 1 disables the pool (§4.M/§5).
    #[arg(default_value_t = 1)]
    pub nthreads: usize,

    /// Run a single cycle and exit instead of waiting on the server
    /// connection for cycle commands.
    #[arg(long)]
    pub one_shot: bool,

    /// Increase log verbosity (stacks: `-v`, `-vv`).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_single_threaded() {
        let cli = Cli::parse_from(["hpc-sched"]);
        assert_eq!(cli.nthreads, 1);
        assert!(!cli.one_shot);
    }

    #[test]
    fn cli_parses_nthreads_and_one_shot() {
        let cli = Cli::parse_from(["hpc-sched", "8", "--one-shot"]);
        assert_eq!(cli.nthreads, 8);
        assert!(cli.one_shot);
    }

    #[test]
    fn holiday_doy_resolves_to_calendar_date() {
        let cfg = SchedConfig { holidays: vec![1, 359], ..Default::default() };
        let dates = cfg.holiday_dates(2026);
        assert_eq!(dates.len(), 2);
        assert_eq!(dates[0].to_string(), "2026-01-01");
    }

    #[test]
    fn out_of_range_doy_is_skipped_not_fatal() {
        let cfg = SchedConfig { holidays: vec![366], ..Default::default() };
        assert!(cfg.holiday_dates(2026).is_empty());
    }
}
