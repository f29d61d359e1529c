//! Job, §3.

use crate::model::queue::QueueId;
use crate::range::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u32);

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct JobState: u32 {
        const QUEUED       = 1 << 0;
        const RUNNING      = 1 << 1;
        const HELD         = 1 << 2;
        const WAITING      = 1 << 3;
        const TRANSIT      = 1 << 4;
        const EXITING      = 1 << 5;
        const SUSPENDED    = 1 << 6;
        const SUSP_SCHED   = 1 << 7;
        const USERBUSY     = 1 << 8;
        const BEGIN        = 1 << 9;
        const EXPIRED      = 1 << 10;
        const CHECKPOINTED = 1 << 11;
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PreemptStatus: u32 {
        const NORMAL      = 0;
        const STARVING    = 1 << 0;
        const OVER_SOFT_LIMIT = 1 << 1;
        const HAS_BEEN_PREEMPTED = 1 << 2;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrueType {
    Ineligible,
    Eligible,
    Running,
    Exiting,
}

#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub owner: String,
    pub group: String,
    pub project: Option<String>,
    pub queue: QueueId,
    pub state: JobState,
    /// `Some` when this is an array job; queued subjob indices.
    pub array_indices: Option<Range>,
    pub parent_array: Option<JobId>,
    /// Lower numeric value = higher priority, matching the server's
    /// preempt-priority convention.
    pub preempt_priority: i32,
    pub preempt_status: PreemptStatus,
    pub estimated_start: Option<i64>,
    pub estimated_execvnode: Option<String>,
    pub dependencies: Vec<JobId>,
    pub accrue_type: AccrueType,
    pub fairshare_entity: String,
    pub eligible_time: i64,
    /// Resource names released while suspended
    /// (`restrict_res_to_release_on_suspend`, §9 open question: exactly
    /// these names are the ones released, nothing more).
    pub release_on_suspend: Vec<String>,
    pub formula_value: f64,
}

impl Job {
    pub fn is_subjob(&self) -> bool {
        self.parent_array.is_some()
    }
}
