//! Node (`node_info`), §3.

use std::collections::HashMap;

use crate::model::queue::QueueId;
use crate::model::resource_resv::ResResvId;
use crate::resource::avail::SchdResource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeState: u32 {
        const FREE               = 1 << 0;
        const OFFLINE            = 1 << 1;
        const DOWN               = 1 << 2;
        const UNKNOWN            = 1 << 3;
        const BUSY               = 1 << 4;
        const STALE              = 1 << 5;
        const MAINTENANCE        = 1 << 6;
        const SLEEPING           = 1 << 7;
        const PROVISIONING       = 1 << 8;
        const WAIT_PROVISIONING  = 1 << 9;
        const JOB_EXCLUSIVE      = 1 << 10;
        const JOB_SHARING        = 1 << 11;
        const RESV_EXCLUSIVE     = 1 << 12;
    }
}

impl NodeState {
    /// `down | free` cannot both be set, and similarly for the other
    /// mutually-exclusive combinations called out in §3.
    pub fn is_internally_consistent(self) -> bool {
        let exclusive_pairs: &[(NodeState, NodeState)] = &[
            (NodeState::DOWN, NodeState::FREE),
            (NodeState::DOWN, NodeState::BUSY),
            (NodeState::OFFLINE, NodeState::FREE),
        ];
        !exclusive_pairs.iter().any(|(a, b)| self.contains(*a) && self.contains(*b))
    }

    /// Whether placement should reject this node outright regardless of
    /// resource match (§4.E step 4), unless the job itself provisions.
    pub fn blocks_placement(self, job_provisions: bool) -> bool {
        self.intersects(NodeState::DOWN | NodeState::STALE | NodeState::UNKNOWN | NodeState::OFFLINE)
            || (self.contains(NodeState::PROVISIONING) && !job_provisions)
            || (self.contains(NodeState::WAIT_PROVISIONING) && !job_provisions)
            || self.contains(NodeState::MAINTENANCE)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub rank: i64,
    pub host: String,
    pub queue: Option<QueueId>,
    pub state: NodeState,
    pub resources: HashMap<String, SchdResource>,
    pub running_jobs: Vec<ResResvId>,
    pub running_resvs: Vec<ResResvId>,
    pub last_state_change: i64,
    pub last_used: i64,
    pub partition: Option<String>,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>, rank: i64) -> Node {
        let name = name.into();
        Node {
            id,
            host: name.clone(),
            name,
            rank,
            queue: None,
            state: NodeState::FREE,
            resources: HashMap::new(),
            running_jobs: Vec::new(),
            running_resvs: Vec::new(),
            last_state_change: 0,
            last_used: 0,
            partition: None,
        }
    }

    pub fn is_free(&self) -> bool {
        !self.state.intersects(
            NodeState::DOWN
                | NodeState::OFFLINE
                | NodeState::UNKNOWN
                | NodeState::STALE
                | NodeState::MAINTENANCE
                | NodeState::JOB_EXCLUSIVE,
        )
    }

    pub fn set_resource(&mut self, name: impl Into<String>, res: SchdResource) {
        self.resources.insert(name.into(), res);
    }

    /// `assigned <= avail` for every consumable (testable property 1).
    pub fn assignments_within_availability(&self) -> bool {
        self.resources.values().all(|r| {
            let Some(avail) = r.avail.as_numeric() else { return true };
            r.assigned <= avail + 1e-9
        })
    }
}
