//! Storage abstraction for the remote family-document store.
//!
//! The engine reads and writes through the [`FamilyStore`] trait and observes
//! confirmed writes through its change feed; it never mutates local state
//! optimistically.

pub mod errors;
mod memory;
pub mod traits;

pub use errors::{StorageError, StorageResult};
pub use memory::{DEFAULT_CHANNEL_CAPACITY, MemoryStore};
pub use traits::{ChangeAction, ChangeEvent, FamilyStore, WriteOp};
