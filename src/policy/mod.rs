//! Cycle policy, sort, and equivalence classing (§4.H).

pub mod equiv;
pub mod sort;

pub use equiv::{EquivClasses, EquivKey};
pub use sort::{multi_key_sort, SortDirection, SortKey};

/// Per-cycle policy snapshot (`status`), read once at cycle start.
#[derive(Debug, Clone)]
pub struct CyclePolicy {
    pub round_robin: bool,
    pub by_queue: bool,
    pub strict_fifo: bool,
    pub strict_ordering: bool,
    pub fair_share: bool,
    pub help_starving_jobs: bool,
    pub backfill: bool,
    pub sort_nodes: bool,
    pub backfill_prime: bool,
    pub preempting: bool,
    pub current_time: i64,
    pub is_prime_time: bool,
    pub is_dedicated_time: bool,
}

impl Default for CyclePolicy {
    fn default() -> CyclePolicy {
        CyclePolicy {
            round_robin: false,
            by_queue: false,
            strict_fifo: false,
            strict_ordering: false,
            fair_share: false,
            help_starving_jobs: false,
            backfill: false,
            sort_nodes: false,
            backfill_prime: false,
            preempting: false,
            current_time: 0,
            is_prime_time: false,
            is_dedicated_time: false,
        }
    }
}
