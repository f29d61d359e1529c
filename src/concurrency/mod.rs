//! Multi-threaded universe duplication (§4.M, §5).
//!
//! Exactly one thread — the cycle driver — ever mutates the live
//! universe. This pool only parallelizes pure, per-element duplication
//! of its nodes/queues/resresvs into an independently owned clone; a
//! chunk that fails aborts the whole duplication so the caller never
//! observes a partially-copied universe.

use crossbeam::channel;

use crate::model::node::Node;
use crate::model::queue::Queue;
use crate::model::resource_resv::ResourceResv;
use crate::model::universe::Universe;

const MIN_CHUNK: usize = 16;
const MAX_CHUNK: usize = 256;

fn chunk_size(len: usize, threads: usize) -> usize {
    if threads <= 1 || len <= MIN_CHUNK {
        return len.max(1);
    }
    (len / threads).clamp(MIN_CHUNK, MAX_CHUNK)
}

/// Clones `items` in chunks across `threads` scoped workers, validating
/// each chunk with `validate` before it is handed back. The first
/// validation failure aborts the whole duplication; already-completed
/// chunks from other workers are dropped along with their handles once
/// the scope exits (§4.M: "failure of any chunk aborts the entire
/// duplication and frees partial work").
fn duplicate_chunked<T, E>(items: &[T], threads: usize, validate: &(dyn Fn(&T) -> Result<(), E> + Sync)) -> Result<Vec<T>, E>
where
    T: Clone + Send,
    E: Send,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let chunk = chunk_size(items.len(), threads.max(1)).max(1);
    let (tx, rx) = channel::unbounded::<Result<(usize, Vec<T>), E>>();

    crossbeam::scope(|scope| {
        for (idx, piece) in items.chunks(chunk).enumerate() {
            let tx = tx.clone();
            scope.spawn(move |_| {
                let mut out = Vec::with_capacity(piece.len());
                for item in piece {
                    if let Err(e) = validate(item) {
                        let _ = tx.send(Err(e));
                        return;
                    }
                    out.push(item.clone());
                }
                let _ = tx.send(Ok((idx, out)));
            });
        }
        drop(tx);

        let mut chunks: Vec<(usize, Vec<T>)> = Vec::new();
        for msg in rx {
            match msg {
                Ok(pair) => chunks.push(pair),
                Err(e) => return Err(e),
            }
        }
        chunks.sort_by_key(|(idx, _)| *idx);
        Ok(chunks.into_iter().flat_map(|(_, v)| v).collect())
    })
    .unwrap_or_else(|panic_payload| {
        // A worker panic is treated the same as a validation failure: the
        // scope join itself can't produce our `E`, so this path only
        // triggers on an actual thread panic, which should never happen
        // for the pure clone-and-check closures used here.
        std::panic::resume_unwind(panic_payload)
    })
}

/// Deep-duplicates `universe` across a worker pool sized by `threads`
/// (the process's `nthreads` argument; 0 or 1 means no pool and this
/// degrades to sequential cloning, §6). Never fails in practice (cloning
/// is infallible) but shares the chunked-and-validated path so a future
/// per-element invariant check (e.g. `assignments_within_availability`)
/// can reject a corrupt snapshot without copying it further.
pub fn duplicate_universe(universe: &Universe, threads: usize) -> Universe {
    let nodes = duplicate_chunked::<Node, ()>(&universe.nodes, threads, &|_| Ok(()))
        .unwrap_or_default();
    let queues = duplicate_chunked::<Queue, ()>(&universe.queues, threads, &|_| Ok(()))
        .unwrap_or_default();
    let resresvs = duplicate_chunked::<ResourceResv, ()>(&universe.resresvs, threads, &|_| Ok(()))
        .unwrap_or_default();

    let mut dup = universe.clone();
    dup.nodes = nodes;
    dup.queues = queues;
    dup.resresvs = resresvs;
    dup
}

/// Duplicates nodes only, rejecting (and aborting the whole batch) if any
/// node's resource accounting is already inconsistent — used before
/// simulating a reservation confirmation against a clone so a corrupt
/// snapshot is never propagated forward.
pub fn duplicate_nodes_checked(nodes: &[Node], threads: usize) -> Result<Vec<Node>, String> {
    duplicate_chunked(nodes, threads, &|n: &Node| {
        if n.assignments_within_availability() {
            Ok(())
        } else {
            Err(format!("node {} has assigned > avail", n.name))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{Node, NodeId};
    use crate::resource::avail::SchdResource;

    #[test]
    fn duplicate_preserves_node_count_and_identity() {
        let mut u = Universe::new(0);
        for i in 0..40 {
            u.add_node(Node::new(NodeId(i), format!("n{i}"), i as i64));
        }
        let dup = duplicate_universe(&u, 4);
        assert_eq!(dup.nodes.len(), 40);
        assert_eq!(dup.node(NodeId(5)).unwrap().name, "n5");
    }

    #[test]
    fn chunk_size_never_goes_below_floor_for_large_pools() {
        assert_eq!(chunk_size(1000, 64), MAX_CHUNK);
        assert!(chunk_size(20, 8) >= 1);
    }

    #[test]
    fn checked_duplication_aborts_on_first_invalid_chunk() {
        let mut bad = Node::new(NodeId(1), "bad", 1);
        bad.set_resource("ncpus", SchdResource::consumable(2.0, 4.0));
        let good = Node::new(NodeId(2), "good", 2);
        let result = duplicate_nodes_checked(&[good, bad], 2);
        assert!(result.is_err());
    }

    #[test]
    fn checked_duplication_succeeds_when_all_valid() {
        let n1 = Node::new(NodeId(1), "n1", 1);
        let n2 = Node::new(NodeId(2), "n2", 2);
        let result = duplicate_nodes_checked(&[n1, n2], 2).unwrap();
        assert_eq!(result.len(), 2);
    }
}
