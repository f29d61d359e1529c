//! Reservation confirmation (§4.J).
//!
//! Runs against a cloned universe so a failed confirmation attempt
//! never corrupts the live one; only a success mirrors its chosen
//! resources back (§9: "duplication is the only way the confirmation
//! engine touches a universe it isn't allowed to mutate directly").

use crate::ifl::{self, IflRequest};
use crate::model::nspec::format_execvnode;
use crate::model::reservation::{Reservation, ReservationState, ReservationSubstate};
use crate::model::resource_resv::ResResvId;
use crate::model::universe::Universe;
use crate::placement::{place_resresv, SchdError};

#[derive(Debug, Clone)]
pub struct OccurrenceResult {
    pub occurrence_index: u32,
    pub execvnode: String,
}

#[derive(Debug, Clone)]
pub enum ConfirmOutcome {
    Success { partition: Option<String>, execvnode_sequence: Vec<String>, request: IflRequest },
    Fail { reason: SchdError },
}

/// Advances a standing reservation's recurrence; the real RRULE
/// evaluation is an external collaborator's concern (§1 scope), so this
/// takes the next start time as already computed by the caller.
pub fn confirm_reservation(
    universe: &mut Universe,
    reservation: &Reservation,
    resresv: ResResvId,
    occurrence_starts: &[i64],
    candidates: &[crate::model::node::NodeId],
) -> ConfirmOutcome {
    let mut shadow = universe.clone();
    let mut results = Vec::new();
    let mut first_start = None;

    for (i, &start) in occurrence_starts.iter().enumerate().skip(reservation.occurrence_index as usize) {
        first_start.get_or_insert(start);
        shadow.server_time = start;
        if let Some(rr) = shadow.resresv_mut(resresv) {
            rr.start = Some(start);
            rr.duration = reservation.req_duration_standing.unwrap_or(reservation.duration);
        }
        match place_resresv(&mut shadow, resresv, candidates) {
            Ok(()) => {
                let execvnode = shadow
                    .resresv(resresv)
                    .map(|rr| format_execvnode(&shadow, &rr.nspecs))
                    .unwrap_or_default();
                results.push(OccurrenceResult { occurrence_index: i as u32, execvnode });
            }
            Err(e) => return ConfirmOutcome::Fail { reason: e },
        }
    }

    *universe = shadow;
    let execvnode_sequence: Vec<String> = results.into_iter().map(|r| r.execvnode).collect();
    let outcome = match &reservation.partition {
        Some(p) => format!("SUCCESS:partition={p}"),
        None => "SUCCESS".to_string(),
    };
    let request = ifl::confirm(
        reservation.id,
        execvnode_sequence.clone(),
        first_start.unwrap_or(reservation.requested_start),
        outcome,
    );
    ConfirmOutcome::Success { partition: reservation.partition.clone(), execvnode_sequence, request }
}

/// Whether this reservation's allocation should be released before the
/// next confirm attempt: only the degraded and alter paths pre-release;
/// a healthy confirmed reservation keeps its nodes until superseded.
pub fn should_release_before_reconfirm(state: ReservationState, substate: ReservationSubstate) -> bool {
    matches!(state, ReservationState::Confirmed) && matches!(substate, ReservationSubstate::Degraded)
        || matches!(state, ReservationState::BeingAltered)
}
