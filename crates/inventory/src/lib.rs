//! Inventory collaborators — everything that touches the outside world.
//!
//! This crate is the single source of truth for both inventory wire
//! contracts: the paginated source API, the target table API (reads and
//! writes), JSON snapshot files, and the field mapper invoked before writes.
//!
//! The engine never sees HTTP or files; it only sees the trait impls here.

mod error;
mod file;
mod mapper;
mod source;
mod target;

pub use error::InventoryError;
pub use file::{load_source_snapshot, load_target_snapshot, write_report};
pub use mapper::{FieldMap, MapperConfig};
pub use source::{SourceClient, SourceSettings};
pub use target::{TargetClient, TargetSettings};
