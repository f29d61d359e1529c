//! Resource definitions (`resdef`), immutable for the duration of a cycle.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResType {
    Long,
    Float,
    Size,
    Time,
    String,
    StringArray,
    Boolean,
}

impl ResType {
    /// A resource is consumable iff numeric and non-boolean (§4.D/§3).
    pub fn is_consumable(self) -> bool {
        matches!(self, ResType::Long | ResType::Float | ResType::Size | ResType::Time)
    }
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ResFlags: u16 {
        const REQUESTABLE   = 1 << 0;
        const SERVER_ASSIGN = 1 << 1;
        const NODE_LEVEL    = 1 << 2;
        const QUEUE_LEVEL   = 1 << 3;
        const RELEASE_ON_SUSPEND = 1 << 4;
        const HOST_LEVEL    = 1 << 5;
        const VNODE_LEVEL   = 1 << 6;
    }
}

#[derive(Debug, Clone)]
pub struct ResDef {
    pub name: String,
    pub ty: ResType,
    pub flags: ResFlags,
}

impl ResDef {
    pub fn new(name: impl Into<String>, ty: ResType, flags: ResFlags) -> ResDef {
        ResDef { name: name.into(), ty, flags }
    }

    pub fn is_consumable(&self) -> bool {
        self.ty.is_consumable()
    }
}

impl fmt::Display for ResDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl PartialEq for ResDef {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for ResDef {}

impl std::hash::Hash for ResDef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
