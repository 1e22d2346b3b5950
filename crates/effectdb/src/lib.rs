//! EffectDB: keyset-paginated queries over an append-only log of ledger
//! effects.
//!
//! ## Crate layout
//! - `core`: composite keys, cursors, query composition, storage port, and
//!   observability.
//! - `config`: paging configuration loaded from TOML.
//! - `error`: the public error type with a stable kind + origin taxonomy.
//!
//! The `prelude` module carries the types a request handler needs.

pub use effectdb_config as config;
pub use effectdb_core as core;

pub mod error;

pub use error::{Error, ErrorKind, ErrorOrigin};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        Error,
        config::{Config, PagingConfig},
        core::{
            db::{
                Cursor, DbSession, Direction, Effect, EffectDetails, EffectStore, EffectType,
                EffectsQuery, ExecContext, MemoryStore, OperationKey, PageQuery,
            },
            obs::{metrics_report, metrics_reset_all},
        },
    };
}
