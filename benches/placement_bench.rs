//! Placement engine benchmarks: how the per-chunk-per-node matching
//! walk scales with node count and select-spec width.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use hpc_sched_core::model::node::{Node, NodeId};
use hpc_sched_core::model::resource_resv::{JobData, ResResvId, ResResvKind, ResourceResv};
use hpc_sched_core::model::universe::Universe;
use hpc_sched_core::placement::place_resresv;
use hpc_sched_core::resource::avail::SchdResource;
use hpc_sched_core::resource::req::ResourceReqList;

fn build_universe(node_count: u32) -> (Universe, Vec<NodeId>) {
    let mut u = Universe::new(0);
    let mut ids = Vec::new();
    for i in 0..node_count {
        let mut n = Node::new(NodeId(i), format!("n{i}"), i as i64);
        n.set_resource("ncpus", SchdResource::consumable(16.0, 0.0));
        ids.push(u.add_node(n));
    }
    (u, ids)
}

fn make_job(id: u32) -> ResourceResv {
    ResourceResv {
        id: ResResvId(id),
        name: format!("job{id}"),
        kind: ResResvKind::Job(JobData { id: hpc_sched_core::model::job::JobId(id), is_peer_ob: false }),
        select: "1:ncpus=4".to_string(),
        place: "free".to_string(),
        exec_select: None,
        nodes: Vec::new(),
        nspecs: Vec::new(),
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

fn bench_place(c: &mut Criterion) {
    let mut group = c.benchmark_group("place_resresv");
    for node_count in [16u32, 128, 1024] {
        group.bench_with_input(BenchmarkId::from_parameter(node_count), &node_count, |b, &node_count| {
            b.iter_batched(
                || {
                    let (mut u, ids) = build_universe(node_count);
                    let id = u.add_resresv(make_job(1));
                    (u, ids, id)
                },
                |(mut u, ids, id)| {
                    let _ = place_resresv(black_box(&mut u), id, &ids);
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_place);
criterion_main!(benches);
