//! Thin per-operation wrappers over the batch protocol (§4.K/§6), named
//! after the operations they issue: `run`, `sigjob`, `alter`, `confirm`,
//! `stat`. Each just shapes a typed request; the actual encode/decode
//! lives in [`crate::codec`] and the framing in [`crate::wire`].

use uuid::Uuid;

use crate::error::SchedResult;
use crate::model::job::JobId;
use crate::model::reservation::ReservationId;
use crate::model::resource_resv::ResResvId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Synchronous,
    Asynchronous,
    AsynchronousWithAck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigKind {
    Suspend,
    Resume,
    AdminSuspend,
    AdminResume,
    TermJob,
    Rerun,
}

#[derive(Debug, Clone)]
pub struct ConfirmRequest {
    pub reservation: ReservationId,
    pub execvnode_sequence: Vec<String>,
    pub start: i64,
    /// `SUCCESS:partition=<p>` or `FAIL`, per §6.
    pub outcome: String,
    /// Correlates this request with its eventual reply; the confirmation
    /// round trip is the one place in §6 where the scheduler issues a
    /// request and must later match an out-of-band ack to it.
    pub correlation_id: Uuid,
}

/// A request body the caller hands to the wire channel; kept separate
/// from the channel itself so the ifl layer stays synchronous and
/// testable without a live connection.
#[derive(Debug, Clone)]
pub enum IflRequest {
    RunJob { job: JobId, mode: RunMode, execvnode: String, ack_token: Option<Uuid> },
    SigJob { job: JobId, kind: SigKind },
    AlterJob { job: JobId, attrs: Vec<(String, String)> },
    ConfirmResv(ConfirmRequest),
    PreemptJobs { jobs: Vec<JobId> },
}

/// Issues a run request for `job` at the given allocation. Only
/// `RunMode::AsynchronousWithAck` carries an `ack_token` — the other two
/// modes either block for the reply inline or never expect one.
pub fn run(job: JobId, mode: RunMode, execvnode: impl Into<String>) -> IflRequest {
    let ack_token = matches!(mode, RunMode::AsynchronousWithAck).then(Uuid::new_v4);
    IflRequest::RunJob { job, mode, execvnode: execvnode.into(), ack_token }
}

pub fn sigjob(job: JobId, kind: SigKind) -> IflRequest {
    IflRequest::SigJob { job, kind }
}

pub fn alter(job: JobId, attrs: Vec<(String, String)>) -> IflRequest {
    IflRequest::AlterJob { job, attrs }
}

pub fn confirm(reservation: ReservationId, execvnode_sequence: Vec<String>, start: i64, outcome: impl Into<String>) -> IflRequest {
    IflRequest::ConfirmResv(ConfirmRequest {
        reservation,
        execvnode_sequence,
        start,
        outcome: outcome.into(),
        correlation_id: Uuid::new_v4(),
    })
}

pub fn preempt_jobs(jobs: Vec<JobId>) -> IflRequest {
    IflRequest::PreemptJobs { jobs }
}

/// Sends a request over an already-handshaked channel and awaits its
/// reply; left generic over the channel type so tests can substitute an
/// in-memory stub instead of a live socket.
#[async_trait::async_trait]
pub trait IflTransport: Send + Sync {
    async fn send(&self, request: IflRequest) -> SchedResult<()>;
}

/// Preempting a job that is itself part of the reservation it would
/// block is never issued; the caller is expected to have already
/// excluded such a case from `victims` (§4.I).
pub fn build_preempt_batch(victims: Vec<ResResvId>, job_ids: impl Fn(ResResvId) -> Option<JobId>) -> IflRequest {
    let jobs = victims.into_iter().filter_map(job_ids).collect();
    preempt_jobs(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_request_carries_execvnode() {
        let req = run(JobId(1), RunMode::Synchronous, "n1+n2");
        match req {
            IflRequest::RunJob { execvnode, ack_token, .. } => {
                assert_eq!(execvnode, "n1+n2");
                assert!(ack_token.is_none());
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn async_with_ack_run_request_carries_a_token() {
        let req = run(JobId(1), RunMode::AsynchronousWithAck, "n1");
        match req {
            IflRequest::RunJob { ack_token, .. } => assert!(ack_token.is_some()),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn confirm_requests_get_distinct_correlation_ids() {
        let a = confirm(ReservationId(1), vec!["n1".into()], 0, "SUCCESS");
        let b = confirm(ReservationId(1), vec!["n1".into()], 0, "SUCCESS");
        match (a, b) {
            (IflRequest::ConfirmResv(a), IflRequest::ConfirmResv(b)) => {
                assert_ne!(a.correlation_id, b.correlation_id);
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn build_preempt_batch_filters_unresolved_ids() {
        let req = build_preempt_batch(vec![ResResvId(1), ResResvId(2)], |id| if id == ResResvId(1) { Some(JobId(10)) } else { None });
        match req {
            IflRequest::PreemptJobs { jobs } => assert_eq!(jobs, vec![JobId(10)]),
            _ => panic!("wrong variant"),
        }
    }
}
