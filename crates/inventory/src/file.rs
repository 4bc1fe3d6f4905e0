//! JSON snapshot files.
//!
//! Snapshots are plain serde renderings of the record vectors, so a file
//! captured from the live APIs can be replayed through the engine offline.

use std::path::Path;

use crosswalk_engine::model::{Report, SourceRecord, TargetRecord};

use crate::error::InventoryError;

pub fn load_source_snapshot(path: &Path) -> Result<Vec<SourceRecord>, InventoryError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| InventoryError::Io(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&data).map_err(|e| InventoryError::Parse(e.to_string()))
}

pub fn load_target_snapshot(path: &Path) -> Result<Vec<TargetRecord>, InventoryError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| InventoryError::Io(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&data).map_err(|e| InventoryError::Parse(e.to_string()))
}

/// Write a sealed report as pretty-printed JSON.
pub fn write_report(path: &Path, report: &Report) -> Result<(), InventoryError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| InventoryError::Parse(e.to_string()))?;
    std::fs::write(path, json)
        .map_err(|e| InventoryError::Io(format!("{}: {}", path.display(), e)))
}
