//! Event calendar / simulation (§4.F).
//!
//! Shares its resource-accounting arithmetic with live placement so that
//! a simulated run is exactly what would happen if it were real —
//! `simulate_events` mutates node/queue assignment the same way the
//! cycle driver does on a confirmed run.

use std::collections::HashMap;

use crate::model::resource_resv::ResResvId;
use crate::model::universe::Universe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Run,
    End,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub event_type: EventType,
    pub time: i64,
    pub target: ResResvId,
    pub disabled: bool,
}

/// Ordered by `time`; ties broken by insertion order (stable), matching
/// the teacher's FIFO splice-on-equal-time behavior.
#[derive(Debug, Clone, Default)]
pub struct Calendar {
    events: Vec<Event>,
    cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulateMode {
    /// Run until `out_time` is reached or exceeded.
    UntilTime(i64),
    /// Run until the named resource-resv becomes runnable.
    UntilRunnable(ResResvId),
    /// Drain the whole calendar.
    Exhaust,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ReachedTime,
    TargetRunnable,
    CalendarExhausted,
}

impl Calendar {
    pub fn new() -> Calendar {
        Calendar { events: Vec::new(), cursor: 0 }
    }

    pub fn create_event(event_type: EventType, time: i64, target: ResResvId) -> Event {
        Event { event_type, time, target, disabled: false }
    }

    /// Splice `event` into time order; stable among equal times.
    pub fn add_event(&mut self, event: Event) -> usize {
        let pos = self.events.iter().position(|e| e.time > event.time).unwrap_or(self.events.len());
        self.events.insert(pos, event);
        if pos < self.cursor {
            self.cursor += 1;
        }
        pos
    }

    /// Unlinks and frees the event at `index`; callers are responsible
    /// for nulling the owning resource-resv's calendar pointer.
    pub fn delete_event(&mut self, index: usize) -> Option<Event> {
        if index >= self.events.len() {
            return None;
        }
        if index < self.cursor {
            self.cursor -= 1;
        }
        Some(self.events.remove(index))
    }

    pub fn set_timed_event_disabled(&mut self, index: usize, disabled: bool) {
        if let Some(e) = self.events.get_mut(index) {
            e.disabled = disabled;
        }
    }

    pub fn find_timed_event(&self, target: ResResvId, event_type: EventType, time: i64) -> Option<usize> {
        self.events
            .iter()
            .position(|e| e.target == target && e.event_type == event_type && e.time == time)
    }

    pub fn is_empty(&self) -> bool {
        self.cursor >= self.events.len()
    }

    /// Advances from "now" applying `update_resresv_on_run`/`_on_end` to
    /// the universe's shared accounting until a stop condition is met.
    pub fn simulate_events(&mut self, universe: &mut Universe, mode: SimulateMode) -> (StopReason, i64) {
        let mut now = universe.server_time;
        loop {
            let Some(event) = self.events.get(self.cursor) else {
                return (StopReason::CalendarExhausted, now);
            };
            if let SimulateMode::UntilTime(t) = mode {
                if event.time > t {
                    return (StopReason::ReachedTime, t);
                }
            }
            now = event.time;
            if !event.disabled {
                apply_event(universe, event);
            }
            self.cursor += 1;
            universe.server_time = now;

            if let SimulateMode::UntilRunnable(target) = mode {
                if event.target == target
                    && universe.resresv(target).map_or(false, |rr| rr.is_runnable())
                {
                    return (StopReason::TargetRunnable, now);
                }
            }
        }
    }
}

fn apply_event(universe: &mut Universe, event: &Event) {
    match event.event_type {
        EventType::Run => add_resources(universe, event.target),
        EventType::End => release_resources(universe, event.target),
    }
}

fn add_resources(universe: &mut Universe, target: ResResvId) {
    let Some(rr) = universe.resresv(target) else { return };
    let nodes = rr.nodes.clone();
    let resources: HashMap<String, f64> =
        rr.resources.iter().filter_map(|r| r.value.as_numeric().map(|v| (r.name.clone(), v))).collect();
    for node_id in &nodes {
        if let Some(node) = universe.node_mut(*node_id) {
            for (name, amt) in &resources {
                if let Some(res) = node.resources.get_mut(name) {
                    res.assigned += amt;
                }
            }
        }
    }
}

/// Frees `target`'s resource-resv allocation from the nodes it holds;
/// shared by the `End` event and by preemption, which releases a
/// victim's resources immediately rather than waiting for its event.
pub fn release_resources(universe: &mut Universe, target: ResResvId) {
    let Some(rr) = universe.resresv(target) else { return };
    let nodes = rr.nodes.clone();
    let resources: HashMap<String, f64> =
        rr.resources.iter().filter_map(|r| r.value.as_numeric().map(|v| (r.name.clone(), v))).collect();
    for node_id in &nodes {
        if let Some(node) = universe.node_mut(*node_id) {
            for (name, amt) in &resources {
                if let Some(res) = node.resources.get_mut(name) {
                    res.assigned = (res.assigned - amt).max(0.0);
                }
            }
        }
    }
}
