//! Query composition over the effects log.

mod effects;
mod error;
pub mod filter;
pub mod spec;


pub use effects::EffectsQuery;
pub use error::{LookupEntity, QueryError};
pub use filter::KeyRange;
pub use spec::{Join, OrderTerm, QuerySpec, Source};
