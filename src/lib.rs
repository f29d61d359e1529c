//! Core scheduling cycle, placement, calendar, and preemption engine
//! for an HPC batch workload scheduler.
//!
//! This crate owns the cycle's decision-making: materializing a
//! per-cycle universe from server state, placing and preempting jobs,
//! confirming reservations, and simulating the calendar. It does not
//! own the batch wire protocol's byte-level codec beyond what's needed
//! to drive that decision-making (see [`wire`], [`codec`]).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod calendar;
pub mod codec;
pub mod concurrency;
pub mod confirm;
pub mod config;
pub mod cycle;
pub mod error;
pub mod fairshare;
pub mod ifl;
pub mod iprange;
pub mod model;
pub mod placement;
pub mod policy;
pub mod preempt;
pub mod range;
pub mod resource;
pub mod server;
pub mod wire;

pub use error::{SchedError, SchedResult};
pub use model::{
    Job, JobId, JobState, Node, NodeId, NodeState, Nspec, Queue, QueueId, ReservationState,
    ReservationSubstate, ResResvId, ResResvKind, ResourceResv, Universe,
};
pub use placement::place_resresv;
