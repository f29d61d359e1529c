//! Queue (`queue_info`), §3.

use std::collections::HashMap;

use crate::model::node::NodeId;
use crate::model::reservation::ReservationId;
use crate::resource::avail::SchdResource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueId(pub u32);

#[derive(Debug, Clone, Default)]
pub struct Limit {
    pub hard: Option<u32>,
    pub soft: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct LimitCounters {
    pub by_user: HashMap<String, (u32, Limit)>,
    pub by_group: HashMap<String, (u32, Limit)>,
    pub by_project: HashMap<String, (u32, Limit)>,
}

impl LimitCounters {
    /// `true` if running one more job for `entity` would exceed its hard
    /// limit — a `NEVER_RUN` condition per §7 if the job itself already
    /// exceeds the max possible (checked by the caller), else `RUN_LATER`.
    fn exceeds(counter: Option<&(u32, Limit)>) -> bool {
        match counter {
            Some((running, limit)) => limit.hard.map_or(false, |h| *running >= h),
            None => false,
        }
    }

    pub fn user_over_hard_limit(&self, user: &str) -> bool {
        Self::exceeds(self.by_user.get(user))
    }

    pub fn user_over_soft_limit(&self, user: &str) -> bool {
        match self.by_user.get(user) {
            Some((running, limit)) => limit.soft.map_or(false, |s| *running >= s),
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Queue {
    pub id: QueueId,
    pub name: String,
    pub started: bool,
    pub enabled: bool,
    pub resources_available: HashMap<String, SchdResource>,
    pub limits: LimitCounters,
    /// `Some` when the queue has a `node-assoc`; jobs in it are confined to
    /// this node set.
    pub node_assoc: Option<Vec<NodeId>>,
    /// `Some` when this is a reservation queue: jobs are confined to the
    /// reservation's universe and start/stop follows reservation state —
    /// modeled as a derived view (§9: "a reservation's queue is a derived
    /// artifact, not an independently-owned queue"), not a separate object.
    pub reservation: Option<ReservationId>,
    pub is_primetime_only: bool,
    pub is_dedicated_time_only: bool,
}

impl Queue {
    pub fn new(id: QueueId, name: impl Into<String>) -> Queue {
        Queue {
            id,
            name: name.into(),
            started: true,
            enabled: true,
            resources_available: HashMap::new(),
            limits: LimitCounters::default(),
            node_assoc: None,
            reservation: None,
            is_primetime_only: false,
            is_dedicated_time_only: false,
        }
    }

    pub fn is_startable(&self) -> bool {
        self.started && self.enabled
    }

    pub fn is_reservation_queue(&self) -> bool {
        self.reservation.is_some()
    }
}
