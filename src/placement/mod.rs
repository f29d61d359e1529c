//! Placement engine (§4.E): turns a select/place spec and a candidate
//! node list into a concrete `nspec` allocation, or a `schd_error`
//! explaining why not.

pub mod engine;
pub mod place;
pub mod schd_error;
pub mod select;
pub mod spec_cache;

pub use engine::{place_resresv, place_resresv_cached};
pub use place::{Arrangement, PlaceSpec, Sharing};
pub use schd_error::{ErrorClass, ErrorKind, SchdError};
pub use select::{Chunk, SelectSpec};
pub use spec_cache::SelectSpecCache;
