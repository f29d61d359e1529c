//! Reservation (`resv_info`), §3.

use crate::model::node::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReservationId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationState {
    Unconfirmed,
    Confirmed,
    Running,
    BeingAltered,
    DeletingJobs,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationSubstate {
    Normal,
    Degraded,
    InConflict,
    AlteredOrigValues,
}

#[derive(Debug, Clone)]
pub struct RecurrenceRule {
    /// An RFC5545-style RRULE string, interpreted by the caller;
    /// kept opaque here since the recurrence engine is an external
    /// collaborator's format (§1 scope).
    pub rrule: String,
    pub timezone: String,
}

#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: ReservationId,
    pub requested_start: i64,
    pub requested_end: i64,
    pub duration: i64,
    pub recurrence: Option<RecurrenceRule>,
    /// 1-based, matching the server's numbering (§9 open question: the
    /// scheduler adjusts this for elapsed occurrences when unrolling).
    pub occurrence_index: u32,
    pub occurrence_count: Option<u32>,
    pub execvnode_sequence: Vec<String>,
    pub state: ReservationState,
    pub substate: ReservationSubstate,
    pub retry_time: Option<i64>,
    pub partition: Option<String>,
    pub resv_nodes: Vec<NodeId>,
    /// Captured when only the first occurrence of a standing reservation is
    /// altered (§4.J): later occurrences keep using these, not the altered
    /// first occurrence's values.
    pub req_start_standing: Option<i64>,
    pub req_duration_standing: Option<i64>,
}

impl Reservation {
    pub fn is_standing(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Confirmable iff unconfirmed, being altered, or confirmed-but-degraded
    /// with a retry time in the past (§4.J).
    pub fn is_confirmable(&self, now: i64) -> bool {
        match self.state {
            ReservationState::Unconfirmed | ReservationState::BeingAltered => true,
            ReservationState::Confirmed => {
                self.substate == ReservationSubstate::Degraded
                    && self.retry_time.map_or(false, |t| t <= now)
            }
            _ => false,
        }
    }
}
