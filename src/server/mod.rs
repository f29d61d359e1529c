//! Server connection: stat requests, circuit breaking, and conversion
//! of batch-status records into the universe (§4.C, §6).

pub mod circuit_breaker;
pub mod materialize;

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::SchedResult;
use crate::model::universe::Universe;
use crate::server::circuit_breaker::CircuitBreaker;
use crate::server::materialize::{RawJob, RawNode, RawQueue};

/// What a cycle asks the server for; each variant maps to one of the
/// batch-request body types described in §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatRequest {
    Server,
    Scheduler,
    Queues,
    Nodes,
    Reservations,
    Jobs,
}

/// One response bundle for a full stat fan-out (§4.C step 2). `Serialize`
/// lets `--one-shot` diagnostics dump the raw snapshot a cycle saw.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub nodes: Vec<RawNode>,
    pub queues: Vec<RawQueue>,
    pub jobs: Vec<RawJob>,
}

/// Abstracts the actual batch protocol round trip so the cycle driver
/// and tests don't depend on a live connection.
#[async_trait]
pub trait ServerConn: Send + Sync {
    async fn stat(&self, request: StatRequest) -> SchedResult<()>;
    async fn fetch_snapshot(&self) -> SchedResult<StatSnapshot>;
}

pub struct ServerConnection<C: ServerConn> {
    conn: C,
    breaker: CircuitBreaker,
}

impl<C: ServerConn> ServerConnection<C> {
    pub fn new(conn: C) -> ServerConnection<C> {
        ServerConnection { conn, breaker: CircuitBreaker::new(3, Duration::from_secs(30)) }
    }

    /// Runs the full §4.C stat fan-out behind the circuit breaker and
    /// materializes the result into `universe`.
    #[instrument(skip(self, universe))]
    pub async fn stat_and_build(&self, universe: &mut Universe) -> SchedResult<()> {
        self.prime_stat_cache().await?;
        let snapshot = self.breaker.execute(|| self.conn.fetch_snapshot()).await?;
        materialize::materialize_queues(universe, snapshot.queues);
        materialize::materialize_nodes(universe, snapshot.nodes);
        let _jobs = materialize::materialize_jobs(snapshot.jobs);
        Ok(())
    }

    /// Issues the queues/nodes/jobs stat requests concurrently (§4.C step
    /// 2 treats them as independent batch requests) rather than waiting
    /// on each in turn before the combined snapshot is fetched. The first
    /// failure among them is what's returned; the others are still
    /// allowed to finish so a slow one doesn't mask a faster failure.
    async fn prime_stat_cache(&self) -> SchedResult<()> {
        let requests = [StatRequest::Queues, StatRequest::Nodes, StatRequest::Jobs];
        let results = join_all(requests.iter().map(|&r| self.conn.stat(r))).await;
        for result in results {
            result?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeConn {
        snapshot: StatSnapshot,
    }

    #[async_trait]
    impl ServerConn for FakeConn {
        async fn stat(&self, _request: StatRequest) -> SchedResult<()> {
            Ok(())
        }

        async fn fetch_snapshot(&self) -> SchedResult<StatSnapshot> {
            Ok(self.snapshot.clone())
        }
    }

    #[tokio::test]
    async fn stat_and_build_materializes_nodes() {
        let conn = FakeConn {
            snapshot: StatSnapshot {
                nodes: vec![RawNode {
                    id: 1,
                    name: "n1".into(),
                    rank: 1,
                    host: "n1".into(),
                    queue: None,
                    state_tokens: vec!["free".into()],
                }],
                queues: vec![],
                jobs: vec![],
            },
        };
        let server = ServerConnection::new(conn);
        let mut universe = Universe::new(0);
        server.stat_and_build(&mut universe).await.unwrap();
        assert_eq!(universe.nodes.len(), 1);
    }
}
