//! Resource availability (`schd_resource`), attached to nodes, queues, and
//! the server (§3/§4.D).
//!
//! A resource may be *indirect*: its true value lives on a named "source"
//! vnode. Indirection is resolved once per cycle when nodes are
//! materialized (§4.D) — by the time placement runs, [`SchdResource::indirect`]
//! has already been turned into a direct node-array index, and reads/writes
//! during placement/simulation redirect through [`crate::model::universe::Universe::resolve_resource`].

use crate::model::node::NodeId;
use crate::resource::value::ResourceValue;

#[derive(Debug, Clone)]
pub struct SchdResource {
    pub avail: ResourceValue,
    /// Only meaningful for consumables; non-consumables ignore it.
    pub assigned: f64,
    /// Resolved source vnode, if this resource is indirect.
    pub indirect: Option<NodeId>,
}

impl SchdResource {
    pub fn consumable(avail: f64, assigned: f64) -> SchdResource {
        SchdResource { avail: ResourceValue::Float(avail), assigned, indirect: None }
    }

    pub fn non_consumable(value: ResourceValue) -> SchdResource {
        SchdResource { avail: value, assigned: 0.0, indirect: None }
    }

    /// Live quantity for a *direct* consumable: `avail - assigned`, floored
    /// at zero (§4.D). Callers must resolve indirection before calling this.
    pub fn live_direct(&self) -> f64 {
        let avail = self.avail.as_numeric().unwrap_or(0.0);
        (avail - self.assigned).max(0.0)
    }

    pub fn compare_consumable(request_amount: f64, available: f64) -> bool {
        request_amount <= available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_direct_floors_at_zero() {
        let r = SchdResource::consumable(4.0, 6.0);
        assert_eq!(r.live_direct(), 0.0);
        let r2 = SchdResource::consumable(8.0, 3.0);
        assert_eq!(r2.live_direct(), 5.0);
    }
}
