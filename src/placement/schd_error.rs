//! `schd_error`, §3/§4.E: why a resource-resv failed to place, and
//! whether the cycle should bother retrying it.

use crate::model::node::NodeId;

/// Determines how long a failure sticks (§4.E step 1, §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// No amount of waiting or reconfiguration within this cycle helps;
    /// never attempt again until the job/reservation changes.
    NeverRun,
    /// Cannot run this cycle but might on a later one (e.g. transient
    /// resource contention); eligible for calendar-based retry.
    RunLater,
    /// Did not run for a policy reason (limit, hold) rather than a
    /// resource shortfall; also retryable later.
    NotRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    InsufficientResource { resource: String },
    NodeState,
    SharingConflict,
    AoeMismatch,
    LimitExceeded,
    NoNodeResource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchdError {
    pub class: ErrorClass,
    pub kind: ErrorKind,
    pub node: Option<NodeId>,
}

impl SchdError {
    pub fn new(class: ErrorClass, kind: ErrorKind, node: Option<NodeId>) -> SchdError {
        SchdError { class, kind, node }
    }

    pub fn insufficient(resource: impl Into<String>, node: NodeId) -> SchdError {
        SchdError::new(
            ErrorClass::RunLater,
            ErrorKind::InsufficientResource { resource: resource.into() },
            Some(node),
        )
    }

    pub fn node_state(node: NodeId) -> SchdError {
        SchdError::new(ErrorClass::RunLater, ErrorKind::NodeState, Some(node))
    }

    pub fn no_node_resource() -> SchdError {
        SchdError::new(ErrorClass::NeverRun, ErrorKind::NoNodeResource, None)
    }

    pub fn limit_exceeded() -> SchdError {
        SchdError::new(ErrorClass::NotRun, ErrorKind::LimitExceeded, None)
    }
}
