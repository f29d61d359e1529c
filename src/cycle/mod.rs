//! Cycle driver (§4.K): one scheduling cycle, bounded by configured
//! work limits, ending with the universe freed and only the fair-share
//! tree preserved.

use serde::Serialize;
use tracing::{info, warn};

use crate::calendar::{self, Calendar, EventType};
use crate::fairshare::FairshareTree;
use crate::ifl::{self, IflRequest, RunMode};
use crate::model::node::NodeId;
use crate::model::resource_resv::ResResvId;
use crate::model::universe::Universe;
use crate::placement::{place_resresv_cached, ErrorClass, ErrorKind, SchdError, SelectSpecCache};
use crate::policy::CyclePolicy;
use crate::preempt::minimal_preemption_set;

#[derive(Debug, Clone, Copy, Default)]
pub struct CycleLimits {
    pub max_jobs_to_check: Option<u32>,
    pub max_preempt_attempts: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Ran,
    Failed,
    Skipped,
}

/// `Serialize` so `--one-shot -v` runs can emit this as a JSON line for
/// an operator's log aggregator rather than just the `tracing` text form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleReport {
    pub jobs_checked: u32,
    pub jobs_run: u32,
    pub jobs_deferred: u32,
    pub jobs_preempted: u32,
    pub jobs_backfilled: u32,
    pub bounded_exit: bool,
}

/// Runs the main loop over an already-sorted job queue: pop, attempt
/// placement, and on failure consult the `schd_error` class to decide
/// between preempting lower-priority work, backfilling the job as a top
/// job against the calendar, or recording it and moving on (§4.K steps
/// 5-6). Every request the cycle needs to hand to the server — a run, a
/// preempt batch — is appended to the returned outbox rather than sent
/// directly, keeping this function free of any live connection.
///
/// Reservation confirmation is intentionally out of scope here — per
/// step 4, a cycle that has confirmable reservations only confirms
/// them, skipping the main loop entirely; the caller is responsible for
/// branching before calling this.
pub fn run_main_loop(
    universe: &mut Universe,
    calendar: &mut Calendar,
    queue: &[ResResvId],
    candidates: &[NodeId],
    limits: CycleLimits,
    policy: &CyclePolicy,
) -> (CycleReport, Vec<IflRequest>) {
    let mut report = CycleReport::default();
    let mut outbox = Vec::new();
    // Shared across every job this cycle checks: most jobs in a queue
    // belong to a handful of equivalence classes (§4.H) and repeat the
    // same `select` string, so the parse only has to happen once per class.
    let spec_cache = SelectSpecCache::new();

    for &job in queue {
        if let Some(max) = limits.max_jobs_to_check {
            if report.jobs_checked >= max {
                warn!(max, "sched_cycle_length exceeded, exiting main loop cleanly");
                report.bounded_exit = true;
                break;
            }
        }
        report.jobs_checked += 1;

        match place_resresv_cached(universe, job, candidates, &spec_cache) {
            Ok(()) => {
                report.jobs_run += 1;
                info!(job = job.0, "job placed");
                emit_run_request(universe, job, &mut outbox);
            }
            Err(e) => {
                report.jobs_deferred += 1;
                let recovered = (policy.preempting
                    && try_preempt(universe, job, &e, candidates, &spec_cache, limits.max_preempt_attempts, &mut report, &mut outbox))
                    || (policy.backfill && try_backfill(universe, calendar, job, &e, &mut report));
                if !recovered {
                    record_and_skip(universe, job, e.class);
                }
            }
        }
    }

    (report, outbox)
}

fn emit_run_request(universe: &Universe, job: ResResvId, outbox: &mut Vec<IflRequest>) {
    if let Some(rr) = universe.resresv(job) {
        if let Some(job_id) = rr.job_id() {
            outbox.push(ifl::run(job_id, RunMode::Synchronous, rr.exec_select.clone().unwrap_or_default()));
        }
    }
}

fn record_and_skip(universe: &mut Universe, job: ResResvId, class: ErrorClass) {
    match class {
        ErrorClass::NeverRun => {
            if let Some(rr) = universe.resresv_mut(job) {
                rr.can_never_run = true;
            }
        }
        ErrorClass::RunLater | ErrorClass::NotRun => {
            if let Some(rr) = universe.resresv_mut(job) {
                rr.can_not_run = true;
            }
        }
    }
}

/// Attempts to free `job`'s blocking resource by preempting lower
/// sequence-rank jobs holding the node `error` names, then retries
/// placement once (§4.I). Only resource-shortfall errors are eligible —
/// a `NodeState`/`SharingConflict` failure has no victim to free.
fn try_preempt(
    universe: &mut Universe,
    job: ResResvId,
    error: &SchdError,
    candidates: &[NodeId],
    spec_cache: &SelectSpecCache,
    max_attempts: Option<u32>,
    report: &mut CycleReport,
    outbox: &mut Vec<IflRequest>,
) -> bool {
    let ErrorKind::InsufficientResource { resource } = &error.kind else { return false };
    let Some(blocking_node) = error.node else { return false };
    let Some(requester) = universe.resresv(job) else { return false };
    let requester_rank = requester.sequence_rank;
    let needed_amount = requester.resources.get(resource).and_then(|r| r.value.as_numeric()).unwrap_or(1.0);

    let victims: Vec<ResResvId> = universe
        .resresvs
        .iter()
        .filter(|v| v.id != job && v.is_job() && v.nodes.contains(&blocking_node) && v.sequence_rank < requester_rank)
        .map(|v| v.id)
        .collect();
    if victims.is_empty() {
        return false;
    }
    let max_attempts = max_attempts.map(|m| m as usize).unwrap_or(victims.len());

    let Some(chosen) = minimal_preemption_set(universe, job, &victims, &[(resource.clone(), needed_amount)], max_attempts) else {
        return false;
    };
    if chosen.is_empty() {
        return false;
    }

    for &victim in &chosen {
        calendar::release_resources(universe, victim);
        if let Some(v) = universe.resresv_mut(victim) {
            v.nodes.clear();
            v.nspecs.clear();
            v.exec_select = None;
            v.can_not_run = true;
        }
    }
    outbox.push(ifl::build_preempt_batch(chosen.clone(), |id| universe.resresv(id).and_then(|r| r.job_id())));

    match place_resresv_cached(universe, job, candidates, spec_cache) {
        Ok(()) => {
            report.jobs_run += 1;
            report.jobs_preempted += chosen.len() as u32;
            emit_run_request(universe, job, outbox);
            true
        }
        Err(_) => false,
    }
}

/// Schedules `job` to run once the node `error` names frees up, adding
/// run/end calendar events so later jobs in this cycle see the window as
/// reserved (§4.K step 6, §8 scenario 3). Conservative: assumes the node
/// stays fully committed until the last conflicting resource-resv ends.
fn try_backfill(universe: &mut Universe, calendar: &mut Calendar, job: ResResvId, error: &SchdError, report: &mut CycleReport) -> bool {
    let Some(blocking_node) = error.node else { return false };
    let now = universe.server_time;
    let run_time = universe
        .resresvs
        .iter()
        .filter(|v| v.nodes.contains(&blocking_node))
        .filter_map(|v| v.end)
        .filter(|&end| end > now)
        .max();
    let Some(run_time) = run_time else { return false };

    let Some(rr) = universe.resresv_mut(job) else { return false };
    let duration = if rr.hard_duration > 0 { rr.hard_duration } else { rr.duration };
    if duration <= 0 {
        return false;
    }
    let end_time = run_time + duration;
    rr.start = Some(run_time);
    rr.end = Some(end_time);
    rr.can_not_run = true;

    let run_idx = calendar.add_event(Calendar::create_event(EventType::Run, run_time, job));
    calendar.add_event(Calendar::create_event(EventType::End, end_time, job));
    if let Some(rr) = universe.resresv_mut(job) {
        rr.calendar_event = Some(run_idx);
    }
    report.jobs_backfilled += 1;
    true
}

/// End-of-cycle teardown (§4.K step 7): only the fair-share tree
/// survives a cycle; everything else (the universe, ephemeral
/// placement state) is dropped by the caller once this returns.
pub fn end_cycle(fairshare: &mut FairshareTree, universe: &Universe) {
    for rr in &universe.resresvs {
        if rr.can_not_run {
            info!(job = rr.id.0, "writing back can_not_run state at cycle end");
        }
    }
    let _ = fairshare;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{Node, NodeId};
    use crate::model::resource_resv::{JobData, ResResvKind, ResourceResv};
    use crate::resource::avail::SchdResource;
    use crate::resource::req::ResourceReqList;

    fn job(id: u32, ncpus: &str) -> ResourceResv {
        let mut resources = ResourceReqList::new();
        if let Ok(amount) = ncpus.parse::<f64>() {
            resources.set("ncpus", crate::resource::value::ResourceValue::Float(amount));
        }
        ResourceResv {
            id: ResResvId(id),
            name: format!("job{id}"),
            kind: ResResvKind::Job(JobData { id: crate::model::job::JobId(id), is_peer_ob: false }),
            select: format!("1:ncpus={ncpus}"),
            place: "free".into(),
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
            resources,
        }
    }

    #[test]
    fn bounded_exit_stops_after_max_jobs_checked() {
        let mut u = Universe::new(0);
        let mut n = Node::new(NodeId(1), "n1", 1);
        n.set_resource("ncpus", SchdResource::consumable(8.0, 0.0));
        u.add_node(n);
        let j1 = u.add_resresv(job(1, "2"));
        let j2 = u.add_resresv(job(2, "2"));
        let limits = CycleLimits { max_jobs_to_check: Some(1), max_preempt_attempts: None };
        let mut cal = Calendar::new();
        let (report, _) = run_main_loop(&mut u, &mut cal, &[j1, j2], &[NodeId(1)], limits, &CyclePolicy::default());
        assert!(report.bounded_exit);
        assert_eq!(report.jobs_checked, 1);
    }

    #[test]
    fn failed_job_is_marked_can_not_run() {
        let mut u = Universe::new(0);
        let mut n = Node::new(NodeId(1), "n1", 1);
        n.set_resource("ncpus", SchdResource::consumable(1.0, 0.0));
        u.add_node(n);
        let j1 = u.add_resresv(job(1, "4"));
        let mut cal = Calendar::new();
        run_main_loop(&mut u, &mut cal, &[j1], &[NodeId(1)], CycleLimits::default(), &CyclePolicy::default());
        assert!(u.resresv(j1).unwrap().can_not_run);
    }

    #[test]
    fn successful_job_emits_a_run_request() {
        let mut u = Universe::new(0);
        let mut n = Node::new(NodeId(1), "n1", 1);
        n.set_resource("ncpus", SchdResource::consumable(8.0, 0.0));
        u.add_node(n);
        let j1 = u.add_resresv(job(1, "4"));
        let mut cal = Calendar::new();
        let (report, outbox) = run_main_loop(&mut u, &mut cal, &[j1], &[NodeId(1)], CycleLimits::default(), &CyclePolicy::default());
        assert_eq!(report.jobs_run, 1);
        assert_eq!(outbox.len(), 1);
        match &outbox[0] {
            IflRequest::RunJob { job, execvnode, .. } => {
                assert_eq!(*job, crate::model::job::JobId(1));
                assert_eq!(execvnode, "(n1:ncpus=4)");
            }
            _ => panic!("wrong variant"),
        }
    }

    fn low_rank_job(id: u32, rank: i64, ncpus: &str) -> ResourceResv {
        let mut rr = job(id, ncpus);
        rr.sequence_rank = rank;
        rr
    }

    #[test]
    fn preempting_low_priority_job_frees_room_for_high_priority_job() {
        let mut u = Universe::new(0);
        let mut n = Node::new(NodeId(1), "n1", 1);
        n.set_resource("ncpus", SchdResource::consumable(4.0, 0.0));
        u.add_node(n);

        let victim = u.add_resresv(low_rank_job(1, 1, "4"));
        let mut cal = Calendar::new();
        let policy = CyclePolicy { preempting: true, ..CyclePolicy::default() };
        run_main_loop(&mut u, &mut cal, &[victim], &[NodeId(1)], CycleLimits::default(), &CyclePolicy::default());
        assert!(u.resresv(victim).unwrap().nodes.len() == 1);

        let requester = u.add_resresv(low_rank_job(2, 100, "4"));
        let (report, outbox) = run_main_loop(&mut u, &mut cal, &[requester], &[NodeId(1)], CycleLimits::default(), &policy);
        assert_eq!(report.jobs_preempted, 1);
        assert!(u.resresv(victim).unwrap().nodes.is_empty());
        assert!(u.resresv(victim).unwrap().can_not_run);
        assert!(u.resresv(requester).unwrap().nodes.contains(&NodeId(1)));
        assert!(outbox.iter().any(|r| matches!(r, IflRequest::PreemptJobs { .. })));
    }

    #[test]
    fn backfill_schedules_a_calendar_window_when_node_is_busy() {
        let mut u = Universe::new(0);
        let mut n = Node::new(NodeId(1), "n1", 1);
        n.set_resource("ncpus", SchdResource::consumable(4.0, 0.0));
        u.add_node(n);

        let occupant = u.add_resresv(job(1, "4"));
        let mut cal = Calendar::new();
        run_main_loop(&mut u, &mut cal, &[occupant], &[NodeId(1)], CycleLimits::default(), &CyclePolicy::default());
        if let Some(rr) = u.resresv_mut(occupant) {
            rr.end = Some(500);
        }

        let top_job = u.add_resresv(job(2, "4"));
        if let Some(rr) = u.resresv_mut(top_job) {
            rr.duration = 100;
        }
        let policy = CyclePolicy { backfill: true, ..CyclePolicy::default() };
        let (report, _) = run_main_loop(&mut u, &mut cal, &[top_job], &[NodeId(1)], CycleLimits::default(), &policy);
        assert_eq!(report.jobs_backfilled, 1);
        let rr = u.resresv(top_job).unwrap();
        assert_eq!(rr.start, Some(500));
        assert_eq!(rr.end, Some(600));
        assert!(rr.calendar_event.is_some());
        assert!(!cal.is_empty());
    }
}
