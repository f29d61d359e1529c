//! Converts raw batch-status records into universe objects (§4.C).
//!
//! A record that fails validation is *ignored with a warning*, never
//! fatal to the cycle — one bad reservation or subjob should not sink
//! the whole stat pass.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{SchedError, SchedResult};
use crate::model::job::{Job, JobId, JobState};
use crate::model::node::{Node, NodeId, NodeState};
use crate::model::queue::{Queue, QueueId};
use crate::model::universe::Universe;

/// One line of `stat-node` output, already split into attribute pairs
/// by the lower-level batch protocol; materialization only deals with
/// strongly-typed fields, not the wire representation. `Serialize` lets a
/// cycle dump its stat snapshot as JSON for offline diagnostics (§7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    pub id: u32,
    pub name: String,
    pub rank: i64,
    pub host: String,
    pub queue: Option<u32>,
    pub state_tokens: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawQueue {
    pub id: u32,
    pub name: String,
    pub started: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawJob {
    pub id: u32,
    pub name: String,
    pub owner: String,
    pub group: String,
    pub queue: Option<u32>,
    pub select: Option<String>,
}

fn parse_node_state(tokens: &[String]) -> NodeState {
    let mut state = NodeState::empty();
    for t in tokens {
        let flag = match t.as_str() {
            "free" => NodeState::FREE,
            "offline" => NodeState::OFFLINE,
            "down" => NodeState::DOWN,
            "state-unknown" => NodeState::UNKNOWN,
            "busy" => NodeState::BUSY,
            "stale" => NodeState::STALE,
            "maintenance" => NodeState::MAINTENANCE,
            "sleep" => NodeState::SLEEPING,
            "provisioning" => NodeState::PROVISIONING,
            "wait-provisioning" => NodeState::WAIT_PROVISIONING,
            "job-exclusive" => NodeState::JOB_EXCLUSIVE,
            "job-sharing" => NodeState::JOB_SHARING,
            "resv-exclusive" => NodeState::RESV_EXCLUSIVE,
            _ => continue,
        };
        state.insert(flag);
    }
    if state.is_empty() {
        state.insert(NodeState::FREE);
    }
    state
}

/// Materializes validated nodes into `universe`; invalid records are
/// logged and skipped (§4.C: "missing identity" is the node case).
pub fn materialize_nodes(universe: &mut Universe, raw: Vec<RawNode>) {
    for r in raw {
        if r.name.is_empty() {
            warn!(node_id = r.id, "ignoring node record: missing identity");
            continue;
        }
        let mut node = Node::new(NodeId(r.id), r.name, r.rank);
        node.host = r.host;
        node.queue = r.queue.map(QueueId);
        node.state = parse_node_state(&r.state_tokens);
        universe.add_node(node);
    }
}

pub fn materialize_queues(universe: &mut Universe, raw: Vec<RawQueue>) {
    for r in raw {
        if r.name.is_empty() {
            warn!(queue_id = r.id, "ignoring queue record: missing identity");
            continue;
        }
        let mut q = Queue::new(QueueId(r.id), r.name);
        q.started = r.started;
        q.enabled = r.enabled;
        universe.add_queue(q);
    }
}

/// Materializes jobs, returning the list successfully added. A job
/// missing a select spec is ignored with a warning per §4.C.
pub fn materialize_jobs(raw: Vec<RawJob>) -> Vec<Job> {
    let mut jobs = Vec::new();
    for r in raw {
        let Some(_select) = r.select.as_ref() else {
            warn!(job_id = r.id, "ignoring job record: no select spec");
            continue;
        };
        let Some(queue) = r.queue else {
            warn!(job_id = r.id, "ignoring job record: missing identity");
            continue;
        };
        jobs.push(Job {
            id: JobId(r.id),
            owner: r.owner,
            group: r.group,
            project: None,
            queue: QueueId(queue),
            state: JobState::QUEUED,
            array_indices: None,
            parent_array: None,
            preempt_priority: 0,
            preempt_status: crate::model::job::PreemptStatus::NORMAL,
            estimated_start: None,
            estimated_execvnode: None,
            dependencies: Vec::new(),
            accrue_type: crate::model::job::AccrueType::Eligible,
            fairshare_entity: r.owner_key(),
            eligible_time: 0,
            release_on_suspend: Vec::new(),
            formula_value: 0.0,
        });
    }
    jobs
}

impl RawJob {
    fn owner_key(&self) -> String {
        self.owner.clone()
    }
}

/// Top-level `stat-*` fan-out for one cycle, wrapped so a framing error
/// anywhere turns into `SchedError::ServerUnreachable` rather than
/// panicking the cycle driver (§4.C, §7).
pub async fn stat_and_materialize(
    universe: &mut Universe,
    nodes: Vec<RawNode>,
    queues: Vec<RawQueue>,
) -> SchedResult<()> {
    if nodes.is_empty() && queues.is_empty() {
        return Err(SchedError::ServerUnreachable("empty stat response".to_string()));
    }
    materialize_queues(universe, queues);
    materialize_nodes(universe, nodes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_missing_name_is_ignored() {
        let mut u = Universe::new(0);
        materialize_nodes(
            &mut u,
            vec![RawNode { id: 1, name: String::new(), rank: 1, host: String::new(), queue: None, state_tokens: vec![] }],
        );
        assert!(u.nodes.is_empty());
    }

    #[test]
    fn valid_node_parses_state_tokens() {
        let mut u = Universe::new(0);
        materialize_nodes(
            &mut u,
            vec![RawNode {
                id: 1,
                name: "n1".into(),
                rank: 1,
                host: "n1".into(),
                queue: None,
                state_tokens: vec!["down".into(), "offline".into()],
            }],
        );
        let node = u.node(NodeId(1)).unwrap();
        assert!(node.state.contains(NodeState::DOWN));
        assert!(node.state.contains(NodeState::OFFLINE));
    }

    #[test]
    fn job_without_select_is_ignored() {
        let jobs = materialize_jobs(vec![RawJob {
            id: 1,
            name: "j1".into(),
            owner: "alice".into(),
            group: "staff".into(),
            queue: Some(1),
            select: None,
        }]);
        assert!(jobs.is_empty());
    }
}
