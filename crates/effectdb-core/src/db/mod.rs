pub mod access;
pub mod context;
pub mod cursor;
pub mod direction;
pub mod effect;
pub mod key;
pub mod keyset;
pub mod page;
pub mod predicate;
pub mod query;
pub mod session;
pub mod store;

pub use context::{CancelToken, ExecContext};
pub use cursor::{Cursor, CursorDecodeError, decode_cursor, encode_cursor};
pub use direction::Direction;
pub use effect::{Effect, EffectDetails, EffectRow, EffectType};
pub use key::{KeyError, OperationKey};
pub use page::PageQuery;
pub use query::{EffectsQuery, LookupEntity, QueryError, QuerySpec};
pub use session::DbSession;
pub use store::{EffectStore, MemorySnapshot, MemoryStore, StoreError};
