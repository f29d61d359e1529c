//! `resource_resv`, §3: the fields shared by a running/queued job and a
//! reservation, tagged by [`ResResvKind`] instead of the teacher's
//! `is_job`/`is_resv` boolean pair (§9).

use crate::model::job::JobId;
use crate::model::node::NodeId;
use crate::model::nspec::Nspec;
use crate::model::reservation::ReservationId;
use crate::resource::req::ResourceReqList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResResvId(pub u32);

#[derive(Debug, Clone)]
pub struct JobData {
    pub id: JobId,
    /// Set for jobs submitted through a peer scheduling relationship;
    /// placement treats them as already-committed (§4.E).
    pub is_peer_ob: bool,
}

#[derive(Debug, Clone)]
pub struct ResvData {
    pub id: ReservationId,
}

#[derive(Debug, Clone)]
pub enum ResResvKind {
    Job(JobData),
    Resv(ResvData),
}

#[derive(Debug, Clone)]
pub struct ResourceResv {
    pub id: ResResvId,
    pub name: String,
    pub kind: ResResvKind,
    /// Raw select spec string, e.g. `"2:ncpus=4:mem=8gb"` (parsed by the
    /// placement engine, which owns chunk-splitting logic, §4.E).
    pub select: String,
    /// Raw place spec string, e.g. `"scatter:excl"` (§4.E).
    pub place: String,
    pub exec_select: Option<String>,
    pub nodes: Vec<NodeId>,
    pub nspecs: Vec<Nspec>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub duration: i64,
    /// Once set, the job/reservation cannot run longer than this even if
    /// its requested duration is larger (§4.F shrink-to-fit).
    pub hard_duration: i64,
    pub can_not_run: bool,
    /// Distinct from `can_not_run`: no amount of waiting will help, so the
    /// cycle should stop retrying this one permanently (§4.E `schd_error`
    /// `NEVER_RUN` class).
    pub can_never_run: bool,
    pub can_not_fit: bool,
    pub is_invalid: bool,
    pub sequence_rank: i64,
    /// Index into the universe's calendar event list, once scheduled
    /// there (§4.F).
    pub calendar_event: Option<usize>,
    pub resources: ResourceReqList,
}

impl ResourceResv {
    pub fn is_job(&self) -> bool {
        matches!(self.kind, ResResvKind::Job(_))
    }

    pub fn is_resv(&self) -> bool {
        matches!(self.kind, ResResvKind::Resv(_))
    }

    pub fn job_id(&self) -> Option<JobId> {
        match &self.kind {
            ResResvKind::Job(j) => Some(j.id),
            ResResvKind::Resv(_) => None,
        }
    }

    pub fn reservation_id(&self) -> Option<ReservationId> {
        match &self.kind {
            ResResvKind::Resv(r) => Some(r.id),
            ResResvKind::Job(_) => None,
        }
    }

    /// A `schd_error` of class `NEVER_RUN` or `NOT_RUN` should stop further
    /// placement attempts this cycle (§4.E); `RUN_LATER` allows a retry
    /// once the calendar advances.
    pub fn is_runnable(&self) -> bool {
        !self.can_not_run && !self.can_never_run && !self.is_invalid
    }
}
