use crate::model::{RecordKind, SourceRecord, TargetRecord};

/// Read contract of the source inventory. `org: None` lists every
/// organization; implementations decide whether that is one call or many.
pub trait SourceReader {
    type Error: std::error::Error;

    fn list(&self, kind: RecordKind, org: Option<&str>) -> Result<Vec<SourceRecord>, Self::Error>;
}

/// Read contract of the target inventory.
pub trait TargetReader {
    type Error: std::error::Error;

    fn list(&self, kind: RecordKind, org: Option<&str>) -> Result<Vec<TargetRecord>, Self::Error>;
}
