//! Node-specifier (`nspec`), §3: one line of an execvnode assignment,
//! binding a chunk of a resource request to a concrete node.

use crate::model::node::NodeId;
use crate::model::universe::Universe;
use crate::resource::req::ResourceReqList;

#[derive(Debug, Clone)]
pub struct Nspec {
    pub node: NodeId,
    /// The chunk reference this nspec realizes: a number assigned once
    /// per chunk *repetition* in placement order across the whole select
    /// spec, not per chunk definition (`2:ncpus=4` has one chunk
    /// definition but two distinct chunk refs, one per repetition).
    /// `total_chunks(selspec) == count(distinct chunk_index in nspec_arr)`.
    pub chunk_index: usize,
    /// Sub-sequence number within a repeated chunk (`ncpus=2+ncpus=2`
    /// style selects produce more than one `Nspec` per chunk).
    pub sub_seq_number: u32,
    /// Set on the last `Nspec` belonging to a given chunk.
    pub end_of_chunk: bool,
    /// Whether placing this chunk here requires the node to provision
    /// first (§4.E step 4 exemption for `PROVISIONING`/`WAIT_PROVISIONING`).
    pub go_provision: bool,
    pub resources: ResourceReqList,
}

impl Nspec {
    pub fn new(node: NodeId, chunk_index: usize, resources: ResourceReqList) -> Nspec {
        Nspec {
            node,
            chunk_index,
            sub_seq_number: 0,
            end_of_chunk: true,
            go_provision: false,
            resources,
        }
    }
}

/// Canonical string form of an nspec list (§3 glossary, `Execvnode`):
/// `"(vnode:resource=value:…)+…"`, one parenthesized group per `Nspec`
/// entry, joined in placement order. Used both to report a realized
/// placement back to the server (`confirm_resv`, `run_job`) and to
/// rewrite a resource-resv's `exec_select` so retry/restart pins the
/// same vnodes (§4.E step 5).
pub fn format_execvnode(universe: &Universe, nspecs: &[Nspec]) -> String {
    nspecs
        .iter()
        .map(|n| {
            let vnode = universe.node(n.node).map(|node| node.name.as_str()).unwrap_or("?");
            let mut terms = vec![vnode.to_string()];
            for r in n.resources.iter() {
                terms.push(format!("{}={}", r.name, r.value));
            }
            format!("({})", terms.join(":"))
        })
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::value::ResourceValue;

    #[test]
    fn formats_two_whole_node_nspecs() {
        let mut u = Universe::new(0);
        u.add_node(crate::model::node::Node::new(NodeId(1), "n1", 1));
        u.add_node(crate::model::node::Node::new(NodeId(2), "n2", 2));

        let mut r1 = ResourceReqList::new();
        r1.set("ncpus", ResourceValue::Float(8.0));
        let mut r2 = ResourceReqList::new();
        r2.set("ncpus", ResourceValue::Float(8.0));
        let nspecs = vec![Nspec::new(NodeId(1), 0, r1), Nspec::new(NodeId(2), 0, r2)];

        assert_eq!(format_execvnode(&u, &nspecs), "(n1:ncpus=8)+(n2:ncpus=8)");
    }
}
