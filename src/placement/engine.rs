//! Placement decision procedure, §4.E.
//!
//! Grounded on the seven-step procedure: quick reject, candidate universe
//! determination, arrangement, per-chunk-per-node matching, allocation
//! recording, sharing enforcement, and the `schd_error` failure path.

use std::collections::{HashMap, HashSet};

use crate::model::node::{Node, NodeId, NodeState};
use crate::model::nspec::Nspec;
use crate::model::resource_resv::{ResResvId, ResourceResv};
use crate::model::universe::Universe;
use crate::placement::place::{Arrangement, PlaceSpec, Sharing};
use crate::placement::schd_error::SchdError;
use crate::placement::select::{Chunk, SelectSpec};
use crate::placement::spec_cache::SelectSpecCache;
use crate::resource::req::ResourceReqList;
use crate::resource::value::{ResourceValue, TriBool};

/// Per-job overlay of resources already earmarked by earlier chunks of
/// the *same* placement attempt, so step 4's "this same placement's
/// earlier chunks" accounting doesn't require mutating the universe
/// until the whole select spec succeeds.
#[derive(Default)]
struct Overlay {
    assigned: HashMap<(NodeId, String), f64>,
    exclusive_nodes: HashSet<NodeId>,
    used_hosts: HashSet<String>,
    used_nodes: HashSet<NodeId>,
}

impl Overlay {
    fn live(&self, universe: &Universe, node: NodeId, name: &str) -> Option<f64> {
        let base = universe.resolve_live(node, name)?;
        let held = self.assigned.get(&(node, name.to_string())).copied().unwrap_or(0.0);
        Some((base - held).max(0.0))
    }

    fn hold(&mut self, node: NodeId, name: &str, amount: f64) {
        *self.assigned.entry((node, name.to_string())).or_insert(0.0) += amount;
    }
}

fn node_blocks(node: &Node, job_provisions: bool, overlay: &Overlay, reservation_member: bool, sharing: Sharing) -> bool {
    if node.state.blocks_placement(job_provisions) {
        return true;
    }
    if node.state.contains(NodeState::RESV_EXCLUSIVE) && !reservation_member {
        return true;
    }
    if overlay.exclusive_nodes.contains(&node.id) {
        return true;
    }
    if node.state.contains(NodeState::JOB_EXCLUSIVE) {
        return true;
    }
    if node.state.contains(NodeState::JOB_SHARING) && matches!(sharing, Sharing::Excl | Sharing::ExclHost) {
        return true;
    }
    false
}

fn non_consumable_matches(node: &Node, req: &ResourceReqList) -> bool {
    for r in req.iter() {
        let Some(avail) = node.resources.get(&r.name) else {
            return false;
        };
        let ok = match (&r.value, &avail.avail) {
            (ResourceValue::Bool(TriBool::True), ResourceValue::Bool(a)) => ResourceValue::bool_matches(true, *a),
            (ResourceValue::Bool(TriBool::False), ResourceValue::Bool(a)) => ResourceValue::bool_matches(false, *a),
            (ResourceValue::Str(want), ResourceValue::StrArray(list)) => {
                ResourceValue::string_matches(list, want, r.name == "host" || r.name == "vnode")
            }
            (ResourceValue::Str(want), ResourceValue::Str(have)) => want == have,
            // consumables handled separately.
            (ResourceValue::Long(_), _) | (ResourceValue::Float(_), _) | (ResourceValue::Size(_), _) | (ResourceValue::Time(_), _) => {
                continue;
            }
            _ => false,
        };
        if !ok {
            return false;
        }
    }
    true
}

fn consumable_requests(req: &ResourceReqList) -> Vec<(&str, f64)> {
    req.iter()
        .filter_map(|r| r.value.as_numeric().map(|v| (r.name.as_str(), v)))
        .collect()
}

/// Attempts to satisfy one repetition of `chunk` on a single `node`,
/// returning the consumable amounts to hold if it fits whole.
fn try_whole_node(universe: &Universe, overlay: &Overlay, node: &Node, chunk: &Chunk) -> Option<Vec<(String, f64)>> {
    if !non_consumable_matches(node, &chunk.resources) {
        return None;
    }
    let mut holds = Vec::new();
    for (name, want) in consumable_requests(&chunk.resources) {
        let live = overlay.live(universe, node.id, name)?;
        if live + 1e-9 < want {
            return None;
        }
        holds.push((name.to_string(), want));
    }
    Some(holds)
}

/// Places one repetition of a chunk, first trying a single whole node,
/// then falling back to a superchunk split across vnodes of one host
/// (§4.E step 4 bullet 4).
fn place_chunk_once(
    universe: &Universe,
    overlay: &mut Overlay,
    chunk: &Chunk,
    chunk_ref: usize,
    candidates: &[NodeId],
    job_provisions: bool,
    reservation_member: bool,
    sharing: Sharing,
) -> Result<Vec<Nspec>, SchdError> {
    for &id in candidates {
        let Some(node) = universe.node(id) else { continue };
        if overlay.used_nodes.contains(&id) && sharing != Sharing::Shared {
            continue;
        }
        if node_blocks(node, job_provisions, overlay, reservation_member, sharing) {
            continue;
        }
        if let Some(holds) = try_whole_node(universe, overlay, node, chunk) {
            for (name, amt) in &holds {
                overlay.hold(id, name, *amt);
            }
            overlay.used_nodes.insert(id);
            overlay.used_hosts.insert(node.host.clone());
            if matches!(sharing, Sharing::Excl) {
                overlay.exclusive_nodes.insert(id);
            }
            if matches!(sharing, Sharing::ExclHost) {
                for &other in candidates {
                    if universe.node(other).map_or(false, |n| n.host == node.host) {
                        overlay.exclusive_nodes.insert(other);
                    }
                }
            }
            return Ok(vec![Nspec::new(id, chunk_ref, chunk.resources.clone())]);
        }
    }

    // Superchunk: split across multiple vnodes of a single host.
    let mut by_host: HashMap<String, Vec<NodeId>> = HashMap::new();
    for &id in candidates {
        if let Some(node) = universe.node(id) {
            by_host.entry(node.host.clone()).or_default().push(id);
        }
    }
    for (_, host_nodes) in by_host {
        if let Some(nspecs) =
            try_superchunk(universe, overlay, chunk, chunk_ref, &host_nodes, job_provisions, reservation_member, sharing)
        {
            return Ok(nspecs);
        }
    }

    let want = consumable_requests(&chunk.resources);
    let resource = want.first().map(|(n, _)| n.to_string()).unwrap_or_default();
    match candidates.first() {
        Some(&node) => Err(SchdError::insufficient(resource, node)),
        None => Err(SchdError::no_node_resource()),
    }
}

fn try_superchunk(
    universe: &Universe,
    overlay: &mut Overlay,
    chunk: &Chunk,
    chunk_ref: usize,
    host_nodes: &[NodeId],
    job_provisions: bool,
    reservation_member: bool,
    sharing: Sharing,
) -> Option<Vec<Nspec>> {
    let mut remaining: HashMap<String, f64> = consumable_requests(&chunk.resources)
        .into_iter()
        .map(|(n, v)| (n.to_string(), v))
        .collect();
    let mut nspecs = Vec::new();
    let mut holds_by_node: Vec<(NodeId, Vec<(String, f64)>)> = Vec::new();

    for &id in host_nodes {
        if remaining.values().all(|v| *v <= 1e-9) {
            break;
        }
        let node = universe.node(id)?;
        if node_blocks(node, job_provisions, overlay, reservation_member, sharing) {
            continue;
        }
        if !non_consumable_matches(node, &chunk.resources) {
            continue;
        }
        let mut taken = Vec::new();
        for (name, need) in remaining.iter_mut() {
            if *need <= 1e-9 {
                continue;
            }
            let live = overlay.live(universe, id, name).unwrap_or(0.0);
            let take = live.min(*need);
            if take > 1e-9 {
                taken.push((name.clone(), take));
                *need -= take;
            }
        }
        if !taken.is_empty() {
            holds_by_node.push((id, taken));
        }
    }

    if remaining.values().any(|v| *v > 1e-9) {
        return None;
    }

    let last = holds_by_node.len().saturating_sub(1);
    for (i, (id, taken)) in holds_by_node.into_iter().enumerate() {
        for (name, amt) in &taken {
            overlay.hold(id, name, *amt);
        }
        overlay.used_nodes.insert(id);
        let mut req = ResourceReqList::new();
        for (name, amt) in &taken {
            req.set(name.clone(), ResourceValue::Float(*amt));
        }
        let mut nspec = Nspec::new(id, chunk_ref, req);
        nspec.sub_seq_number = i as u32;
        nspec.end_of_chunk = i == last;
        nspecs.push(nspec);
    }
    Some(nspecs)
}

/// Runs the full placement procedure for `resresv_id` against
/// `candidates`, mutating the universe's resource accounting and the
/// resource-resv's `nodes`/`nspecs` only on success.
pub fn place_resresv(
    universe: &mut Universe,
    resresv_id: ResResvId,
    candidates: &[NodeId],
) -> Result<(), SchdError> {
    let select = {
        let rr = universe.resresv(resresv_id).ok_or_else(SchdError::no_node_resource)?;
        rr.select.clone()
    };
    let select = SelectSpec::parse(&select).map_err(|_| SchdError::no_node_resource())?;
    place_resresv_parsed(universe, resresv_id, candidates, select)
}

/// Same as [`place_resresv`], but resolves the select spec through a
/// shared [`SelectSpecCache`] instead of reparsing it — every job in an
/// equivalence class (§4.H) shares one `select` string, so a cycle that
/// walks many jobs with the same shape only pays the parse cost once.
pub fn place_resresv_cached(
    universe: &mut Universe,
    resresv_id: ResResvId,
    candidates: &[NodeId],
    cache: &SelectSpecCache,
) -> Result<(), SchdError> {
    let select = {
        let rr = universe.resresv(resresv_id).ok_or_else(SchdError::no_node_resource)?;
        rr.select.clone()
    };
    let select = cache.get_or_parse(&select).map_err(|_| SchdError::no_node_resource())?;
    place_resresv_parsed(universe, resresv_id, candidates, select)
}

fn place_resresv_parsed(
    universe: &mut Universe,
    resresv_id: ResResvId,
    candidates: &[NodeId],
    select: SelectSpec,
) -> Result<(), SchdError> {
    let (place, job_provisions) = {
        let rr = universe.resresv(resresv_id).ok_or_else(SchdError::no_node_resource)?;
        if rr.can_not_run || rr.can_never_run {
            return Err(SchdError::no_node_resource());
        }
        (rr.place.clone(), false)
    };
    let place = PlaceSpec::parse(&place).map_err(|_| SchdError::no_node_resource())?;

    let mut overlay = Overlay::default();
    let mut all_nspecs: Vec<Nspec> = Vec::new();
    let mut next_chunk_ref: usize = 0;

    for chunk in &select.chunks {
        for _ in 0..chunk.count {
            let chunk_ref = next_chunk_ref;
            next_chunk_ref += 1;
            if matches!(place.arrangement, Arrangement::Scatter) {
                let remaining: Vec<NodeId> = candidates
                    .iter()
                    .copied()
                    .filter(|id| {
                        universe.node(*id).map_or(false, |n| !overlay.used_hosts.contains(&n.host))
                    })
                    .collect();
                let nspecs =
                    place_chunk_once(universe, &mut overlay, chunk, chunk_ref, &remaining, job_provisions, false, place.sharing)?;
                all_nspecs.extend(nspecs);
            } else if matches!(place.arrangement, Arrangement::VScatter) {
                let remaining: Vec<NodeId> =
                    candidates.iter().copied().filter(|id| !overlay.used_nodes.contains(id)).collect();
                let nspecs =
                    place_chunk_once(universe, &mut overlay, chunk, chunk_ref, &remaining, job_provisions, false, place.sharing)?;
                all_nspecs.extend(nspecs);
            } else {
                let nspecs =
                    place_chunk_once(universe, &mut overlay, chunk, chunk_ref, candidates, job_provisions, false, place.sharing)?;
                all_nspecs.extend(nspecs);
            }
        }
    }

    commit(universe, resresv_id, &overlay, all_nspecs);
    Ok(())
}

/// Records the allocation and rewrites `exec_select` from the realized
/// nspecs so a later retry or restart pins the same vnodes (§4.E step 5).
fn commit(universe: &mut Universe, resresv_id: ResResvId, overlay: &Overlay, nspecs: Vec<Nspec>) {
    for ((node_id, name), amount) in &overlay.assigned {
        if let Some(node) = universe.node_mut(*node_id) {
            if let Some(res) = node.resources.get_mut(name) {
                res.assigned += amount;
            }
        }
    }
    for &node_id in &overlay.exclusive_nodes {
        if let Some(node) = universe.node_mut(node_id) {
            node.state.insert(NodeState::JOB_EXCLUSIVE);
        }
    }
    let nodes: Vec<NodeId> = nspecs.iter().map(|n| n.node).collect();
    let exec_select = crate::model::nspec::format_execvnode(universe, &nspecs);
    if let Some(rr) = universe.resresv_mut(resresv_id) {
        rr.nodes = nodes;
        rr.nspecs = nspecs;
        rr.exec_select = Some(exec_select);
    }
}
