//! `crosswalk-engine` — match & deduplication engine.
//!
//! Pure engine crate: receives pre-loaded source/target snapshots, returns a
//! sealed report. No CLI, HTTP, or file dependencies.

pub mod apply;
pub mod candidates;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod normalize;
pub mod readers;
pub mod report;
pub mod review;
pub mod route;
pub mod score;
pub mod similarity;

pub use apply::{ApplyOutcome, FieldMapper, RemoteWriteError, TargetWriter};
pub use config::EngineConfig;
pub use engine::{run, RunInput};
pub use error::EngineError;
pub use model::{MatchAction, MatchDecision, RecordKind, Report, SourceRecord, TargetRecord};
pub use readers::{SourceReader, TargetReader};
pub use review::{apply_resolutions, ReviewOutcome, ReviewRow};
