//! End-to-end reservation confirmation scenario (§8 concrete scenario 4).

use hpc_sched_core::confirm::{confirm_reservation, ConfirmOutcome};
use hpc_sched_core::ifl::IflRequest;
use hpc_sched_core::model::node::{Node, NodeId};
use hpc_sched_core::model::reservation::{Reservation, ReservationId, ReservationState, ReservationSubstate};
use hpc_sched_core::model::resource_resv::{ResResvId, ResResvKind, ResvData, ResourceResv};
use hpc_sched_core::model::universe::Universe;
use hpc_sched_core::resource::avail::SchdResource;
use hpc_sched_core::resource::req::ResourceReqList;

#[test]
fn scenario_4_reservation_confirms_across_two_nodes_and_mirrors_live_universe() {
    let mut u = Universe::new(0);
    for i in 1..=2u32 {
        let mut n = Node::new(NodeId(i), format!("n{i}"), i as i64);
        // n1/n2 are two vnodes of the same multi-vnode host, so a single
        // 16-cpu chunk can be satisfied by combining them (§4.E superchunk).
        n.host = "hostA".to_string();
        n.set_resource("ncpus", SchdResource::consumable(8.0, 0.0));
        u.add_node(n);
    }
    let candidates: Vec<NodeId> = vec![NodeId(1), NodeId(2)];

    let resv_id = ResResvId(1);
    let resresv = ResourceResv {
        id: resv_id,
        name: "R".to_string(),
        kind: ResResvKind::Resv(ResvData { id: ReservationId(1) }),
        select: "1:ncpus=16".to_string(),
        place: "free".to_string(),
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
    };
    u.add_resresv(resresv);

    let reservation = Reservation {
        id: ReservationId(1),
        requested_start: 3600,
        requested_end: 7200,
        duration: 3600,
        recurrence: None,
        occurrence_index: 0,
        occurrence_count: Some(1),
        execvnode_sequence: vec![],
        state: ReservationState::Unconfirmed,
        substate: ReservationSubstate::Normal,
        retry_time: None,
        partition: None,
        resv_nodes: vec![],
        req_start_standing: None,
        req_duration_standing: None,
    };
    assert!(reservation.is_confirmable(0));

    let outcome = confirm_reservation(&mut u, &reservation, resv_id, &[3600], &candidates);

    match outcome {
        ConfirmOutcome::Success { execvnode_sequence, request, .. } => {
            assert_eq!(execvnode_sequence, vec!["(n1:ncpus=8)+(n2:ncpus=8)".to_string()]);
            match request {
                IflRequest::ConfirmResv(req) => {
                    assert_eq!(req.start, 3600);
                    assert_eq!(req.outcome, "SUCCESS");
                }
                _ => panic!("wrong variant"),
            }
        }
        ConfirmOutcome::Fail { reason } => panic!("expected confirmation to succeed, got {reason:?}"),
    }

    // The live universe now reflects the reservation's resource consumption
    // across both nodes, so future job placements honor it.
    assert_eq!(u.node(NodeId(1)).unwrap().resources["ncpus"].assigned, 8.0);
    assert_eq!(u.node(NodeId(2)).unwrap().resources["ncpus"].assigned, 8.0);
}
