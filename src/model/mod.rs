//! The per-cycle in-memory universe (§3, §9): an arena of nodes, queues,
//! and resource-resvs addressed by stable integer indices rather than a
//! manual pointer graph.

pub mod job;
pub mod node;
pub mod nspec;
pub mod queue;
pub mod reservation;
pub mod resource_resv;
pub mod universe;

pub use job::{Job, JobId, JobState};
pub use node::{Node, NodeId, NodeState};
pub use nspec::Nspec;
pub use queue::{Queue, QueueId};
pub use reservation::{Reservation, ReservationState, ReservationSubstate};
pub use resource_resv::{ResResvId, ResResvKind, ResourceResv};
pub use universe::Universe;
