//! # actv-store: Activation Code Store
//!
//! The code store is the single source of truth for redemption state and the
//! only point of coordination between independent request handlers. Every
//! backend implements [`CodeStore`], whose [`CodeStore::reserve`] is one
//! conditional write: "mark this code used only if it is currently unused".
//! There is no read-then-write path to an issued license.
//!
//! ## Backends
//!
//! | Backend | Atomicity | Use |
//! |---|---|---|
//! | [`PgCodeStore`] | `UPDATE … WHERE status = 'unused' RETURNING` | production, many instances |
//! | [`FileCodeStore`] | process-local lock + atomic file replace | single-process local development |
//! | [`MemoryCodeStore`] | process-local lock | tests |
//!
//! The file and memory backends do not coordinate across processes and must
//! not be deployed behind more than one handler instance.

pub mod backend;
pub mod counting;
pub mod error;
pub mod file;
pub mod memory;
pub mod postgres;
pub mod store;

pub use backend::{open, StoreBackend, StoreConfig};
pub use counting::CountingStore;
pub use error::StoreError;
pub use file::FileCodeStore;
pub use memory::MemoryCodeStore;
pub use postgres::PgCodeStore;
pub use store::{CodeStats, CodeStore, NewCode, ReserveOutcome, SeedReport};
