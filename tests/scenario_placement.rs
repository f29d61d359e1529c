//! End-to-end placement scenarios (§8 concrete scenarios 1 and 2).

use hpc_sched_core::model::node::{Node, NodeId};
use hpc_sched_core::model::resource_resv::{JobData, ResResvId, ResResvKind, ResourceResv};
use hpc_sched_core::model::universe::Universe;
use hpc_sched_core::placement::place_resresv;
use hpc_sched_core::resource::avail::SchdResource;
use hpc_sched_core::resource::req::ResourceReqList;

fn four_node_universe(ncpus: f64, mem_kb: i64) -> Universe {
    let mut u = Universe::new(0);
    for i in 1..=4u32 {
        let mut n = Node::new(NodeId(i), format!("n{i}"), i as i64);
        n.set_resource("ncpus", SchdResource::consumable(ncpus, 0.0));
        n.set_resource("mem", SchdResource::consumable(mem_kb as f64, 0.0));
        u.add_node(n);
    }
    u
}

fn job(id: u32, select: &str, place: &str) -> ResourceResv {
    ResourceResv {
        id: ResResvId(id),
        name: format!("job{id}"),
        kind: ResResvKind::Job(JobData { id: hpc_sched_core::model::job::JobId(id), is_peer_ob: false }),
        select: select.to_string(),
        place: place.to_string(),
        exec_select: None,
        nodes: vec![],
        nspecs: vec![],
        start: None,
        end: None,
        duration: 0,
        hard_duration: 0,
        can_not_run: false,
        can_never_run: false,
        can_not_fit: false,
        is_invalid: false,
        sequence_rank: 0,
        calendar_event: None,
        resources: ResourceReqList::new(),
    }
}

#[test]
fn scenario_1_simple_scatter_placement_uses_two_distinct_nodes() {
    let mut u = four_node_universe(8.0, 16 * 1024 * 1024);
    let candidates: Vec<NodeId> = (1..=4).map(NodeId).collect();
    let j1 = u.add_resresv(job(1, "2:ncpus=4:mem=8gb", "scatter"));

    place_resresv(&mut u, j1, &candidates).unwrap();

    let rr = u.resresv(j1).unwrap();
    assert_eq!(rr.nodes.len(), 2);
    assert_ne!(rr.nodes[0], rr.nodes[1]);
    assert_eq!(rr.nspecs.len(), 2);
    assert!(rr.nspecs.iter().all(|n| n.end_of_chunk));
    assert_ne!(rr.nspecs[0].chunk_index, rr.nspecs[1].chunk_index);
    assert_eq!(rr.exec_select.as_deref(), Some("(n1:ncpus=4:mem=8388608kb)+(n2:ncpus=4:mem=8388608kb)"));

    for &node_id in &rr.nodes {
        let node = u.node(node_id).unwrap();
        assert_eq!(node.resources["ncpus"].assigned, 4.0);
        assert_eq!(node.resources["mem"].assigned, 8.0 * 1024.0 * 1024.0);
    }
    let untouched: Vec<NodeId> = candidates.into_iter().filter(|id| !rr.nodes.contains(id)).collect();
    assert_eq!(untouched.len(), 2);
    for id in untouched {
        assert_eq!(u.node(id).unwrap().resources["ncpus"].assigned, 0.0);
    }
}

#[test]
fn scenario_2_superchunk_spreads_across_vnodes_of_one_host() {
    let mut u = Universe::new(0);
    for i in 1..=4u32 {
        let mut n = Node::new(NodeId(i), format!("n{i}"), i as i64);
        // n1 and n2 share a host so the superchunk can combine them.
        n.host = if i <= 2 { "hostA".to_string() } else { format!("host{i}") };
        n.set_resource("ncpus", SchdResource::consumable(2.0, 0.0));
        u.add_node(n);
    }
    let candidates: Vec<NodeId> = (1..=4).map(NodeId).collect();
    let j2 = u.add_resresv(job(2, "1:ncpus=4", "pack"));

    place_resresv(&mut u, j2, &candidates).unwrap();

    let rr = u.resresv(j2).unwrap();
    assert_eq!(rr.nspecs.len(), 2);
    assert_eq!(rr.nspecs[0].sub_seq_number, 0);
    assert!(!rr.nspecs[0].end_of_chunk);
    assert!(rr.nspecs.last().unwrap().end_of_chunk);
    for &node_id in &rr.nodes {
        assert_eq!(u.node(node_id).unwrap().host, "hostA");
    }
}
