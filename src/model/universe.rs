//! `server_info`, §3: the per-cycle arena tying nodes, queues, and
//! resource-resvs together by stable index rather than back-pointers (§9).

use std::collections::HashMap;

use hashbrown::HashMap as RawHashMap;

use crate::model::node::{Node, NodeId};
use crate::model::queue::{Queue, QueueId};
use crate::model::resource_resv::{ResResvId, ResourceResv};
use crate::resource::avail::SchdResource;
use crate::resource::value::ResourceValue;

/// Scheduling policy knobs read once per cycle from server/sched config
/// (§4.H); placement and sort consult these instead of globals.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub round_robin: bool,
    pub by_queue: bool,
    pub strict_fifo: bool,
    pub backfill: bool,
    pub preempt_enabled: bool,
    pub sort_formula: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Universe {
    pub server_time: i64,
    pub nodes: Vec<Node>,
    pub queues: Vec<Queue>,
    pub resresvs: Vec<ResourceResv>,
    pub server_resources: HashMap<String, SchdResource>,
    pub policy: Policy,
    // Hot-path id->index lookup tables: placement walks these once per
    // candidate per chunk, so they use `hashbrown` directly rather than
    // the std re-export.
    node_by_id: RawHashMap<NodeId, usize>,
    queue_by_id: RawHashMap<QueueId, usize>,
    resresv_by_id: RawHashMap<ResResvId, usize>,
    node_by_name: RawHashMap<String, NodeId>,
}

impl Universe {
    pub fn new(server_time: i64) -> Universe {
        Universe {
            server_time,
            nodes: Vec::new(),
            queues: Vec::new(),
            resresvs: Vec::new(),
            server_resources: HashMap::new(),
            policy: Policy::default(),
            node_by_id: RawHashMap::new(),
            queue_by_id: RawHashMap::new(),
            resresv_by_id: RawHashMap::new(),
            node_by_name: RawHashMap::new(),
        }
    }

    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.node_by_name.insert(node.name.clone(), id);
        self.node_by_id.insert(id, self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn add_queue(&mut self, queue: Queue) -> QueueId {
        let id = queue.id;
        self.queue_by_id.insert(id, self.queues.len());
        self.queues.push(queue);
        id
    }

    pub fn add_resresv(&mut self, rr: ResourceResv) -> ResResvId {
        let id = rr.id;
        self.resresv_by_id.insert(id, self.resresvs.len());
        self.resresvs.push(rr);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_by_id.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        match self.node_by_id.get(&id) {
            Some(&i) => Some(&mut self.nodes[i]),
            None => None,
        }
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.node_by_name.get(name).and_then(|id| self.node(*id))
    }

    pub fn queue(&self, id: QueueId) -> Option<&Queue> {
        self.queue_by_id.get(&id).map(|&i| &self.queues[i])
    }

    pub fn queue_mut(&mut self, id: QueueId) -> Option<&mut Queue> {
        match self.queue_by_id.get(&id) {
            Some(&i) => Some(&mut self.queues[i]),
            None => None,
        }
    }

    pub fn resresv(&self, id: ResResvId) -> Option<&ResourceResv> {
        self.resresv_by_id.get(&id).map(|&i| &self.resresvs[i])
    }

    pub fn resresv_mut(&mut self, id: ResResvId) -> Option<&mut ResourceResv> {
        match self.resresv_by_id.get(&id) {
            Some(&i) => Some(&mut self.resresvs[i]),
            None => None,
        }
    }

    /// Resolve a resource's live value, following one level of
    /// indirection to its source vnode if set (§4.D). PBS only ever
    /// resolves a single hop; a chain is a configuration error and is
    /// reported rather than followed further.
    pub fn resolve_resource<'a>(&'a self, node: NodeId, name: &str) -> Option<&'a ResourceValue> {
        let res = self.node(node)?.resources.get(name)?;
        match res.indirect {
            Some(source) => self.node(source)?.resources.get(name).map(|r| &r.avail),
            None => Some(&res.avail),
        }
    }

    /// Resolves a direct-or-indirect resource to its live (avail - assigned)
    /// numeric quantity, used by placement's consumable checks (§4.D).
    pub fn resolve_live(&self, node: NodeId, name: &str) -> Option<f64> {
        let res = self.node(node)?.resources.get(name)?;
        match res.indirect {
            Some(source) => {
                let source_res = self.node(source)?.resources.get(name)?;
                Some((source_res.avail.as_numeric()? - source_res.assigned).max(0.0))
            }
            None => Some(res.live_direct()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::Node;

    #[test]
    fn resolve_resource_follows_single_hop_indirection() {
        let mut u = Universe::new(0);
        let source = u.add_node(Node::new(NodeId(1), "source", 1));
        let mut target = Node::new(NodeId(2), "target", 2);
        target.set_resource(
            "mem",
            SchdResource { avail: ResourceValue::Long(0), assigned: 0.0, indirect: Some(source) },
        );
        u.add_node(target);
        u.node_mut(source).unwrap().set_resource("mem", SchdResource::consumable(16.0, 4.0));

        assert_eq!(u.resolve_live(NodeId(2), "mem"), Some(12.0));
    }

    #[test]
    fn resolve_resource_direct_has_no_indirection() {
        let mut u = Universe::new(0);
        let mut n = Node::new(NodeId(1), "n1", 1);
        n.set_resource("ncpus", SchdResource::consumable(8.0, 2.0));
        u.add_node(n);
        assert_eq!(u.resolve_live(NodeId(1), "ncpus"), Some(6.0));
    }
}
