//! Resource model (§4.D): resource definitions, typed values, requests, and
//! availability arithmetic.

pub mod avail;
pub mod req;
pub mod resdef;
pub mod value;

pub use avail::SchdResource;
pub use req::ResourceReq;
pub use resdef::{ResDef, ResFlags};
pub use value::ResourceValue;
