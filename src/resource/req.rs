//! Resource request list (`resource_req`), §3. Modeled as a growable
//! vector per the §9 design note ("replace linked lists with growable
//! arrays or small-vector types; linear search is fine at these sizes").

use crate::resource::value::ResourceValue;

#[derive(Debug, Clone)]
pub struct ResourceReq {
    pub name: String,
    pub value: ResourceValue,
}

impl ResourceReq {
    pub fn new(name: impl Into<String>, value: ResourceValue) -> ResourceReq {
        ResourceReq { name: name.into(), value }
    }
}

/// A list of resource requests owned by a job, reservation, or chunk.
#[derive(Debug, Clone, Default)]
pub struct ResourceReqList(pub Vec<ResourceReq>);

impl ResourceReqList {
    pub fn new() -> Self {
        ResourceReqList(Vec::new())
    }

    pub fn get(&self, name: &str) -> Option<&ResourceReq> {
        self.0.iter().find(|r| r.name == name)
    }

    pub fn set(&mut self, name: impl Into<String>, value: ResourceValue) {
        let name = name.into();
        if let Some(existing) = self.0.iter_mut().find(|r| r.name == name) {
            existing.value = value;
        } else {
            self.0.push(ResourceReq::new(name, value));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceReq> {
        self.0.iter()
    }

    /// Value-equal iff, after filtering by `only` (when given), every
    /// request matches both ways (§3).
    pub fn value_equal(&self, other: &ResourceReqList, only: Option<&[String]>) -> bool {
        let filter = |list: &ResourceReqList| -> Vec<&ResourceReq> {
            list.0
                .iter()
                .filter(|r| only.map_or(true, |names| names.iter().any(|n| n == &r.name)))
                .collect()
        };
        let a = filter(self);
        let b = filter(other);
        if a.len() != b.len() {
            return false;
        }
        a.iter().all(|ra| b.iter().any(|rb| rb.name == ra.name && values_equal(&ra.value, &rb.value)))
            && b.iter().all(|rb| a.iter().any(|ra| ra.name == rb.name && values_equal(&ra.value, &rb.value)))
    }
}

fn values_equal(a: &ResourceValue, b: &ResourceValue) -> bool {
    format!("{a:?}") == format!("{b:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_equal_both_directions() {
        let mut a = ResourceReqList::new();
        a.set("ncpus", ResourceValue::Long(4));
        a.set("mem", ResourceValue::Size(8 * 1024 * 1024));
        let mut b = ResourceReqList::new();
        b.set("mem", ResourceValue::Size(8 * 1024 * 1024));
        b.set("ncpus", ResourceValue::Long(4));
        assert!(a.value_equal(&b, None));

        b.set("ncpus", ResourceValue::Long(8));
        assert!(!a.value_equal(&b, None));
    }

    #[test]
    fn value_equal_respects_filter_set() {
        let mut a = ResourceReqList::new();
        a.set("ncpus", ResourceValue::Long(4));
        a.set("walltime", ResourceValue::Time(600));
        let mut b = ResourceReqList::new();
        b.set("ncpus", ResourceValue::Long(4));
        b.set("walltime", ResourceValue::Time(1200));
        assert!(!a.value_equal(&b, None));
        assert!(a.value_equal(&b, Some(&["ncpus".to_string()])));
    }
}
