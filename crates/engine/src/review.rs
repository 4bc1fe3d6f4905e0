use std::collections::BTreeMap;

use serde::Serialize;

use crate::apply::{FieldMapper, TargetWriter};
use crate::model::{ErrorEntry, ErrorKind, Resolution, SourceRecord};

// ---------------------------------------------------------------------------
// Review ingestion
// ---------------------------------------------------------------------------

/// One row of an exported review queue after a human filled the resolution
/// column. `resolution` is kept raw so blank and invalid values can be told
/// apart from deliberate verdicts.
#[derive(Debug, Clone)]
pub struct ReviewRow {
    pub source_id: String,
    pub target_id: String,
    pub resolution: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewOutcome {
    pub updated: usize,
    pub kept: usize,
    pub created: usize,
    /// Rows with a blank or unrecognized resolution.
    pub skipped: usize,
    pub errors: Vec<ErrorEntry>,
    pub dry_run: bool,
}

/// Apply reviewer verdicts: a separate, idempotent state transition from
/// unset to {update|keep|create}. Rows without a usable verdict are skipped;
/// per-row failures are recorded and processing continues.
pub fn apply_resolutions(
    rows: &[ReviewRow],
    source: &[SourceRecord],
    writer: &mut dyn TargetWriter,
    mapper: &dyn FieldMapper,
    dry_run: bool,
) -> ReviewOutcome {
    let mut outcome = ReviewOutcome {
        dry_run,
        ..ReviewOutcome::default()
    };

    let source_index: BTreeMap<&str, &SourceRecord> = source
        .iter()
        .filter_map(|r| r.id.as_deref().map(|id| (id, r)))
        .collect();

    for row in rows {
        let resolution = match Resolution::parse(&row.resolution) {
            Some(r) => r,
            None => {
                outcome.skipped += 1;
                continue;
            }
        };

        let record = match source_index.get(row.source_id.as_str()) {
            Some(r) => r,
            None => {
                outcome.errors.push(ErrorEntry {
                    record_id: row.source_id.clone(),
                    kind: ErrorKind::DataQuality,
                    message: "review row references unknown source record".into(),
                });
                continue;
            }
        };

        match resolution {
            Resolution::Keep => outcome.kept += 1,
            Resolution::Update => {
                let mapped = mapper.map_fields(record.kind, &record.fields);
                if dry_run {
                    outcome.updated += 1;
                    continue;
                }
                match writer.update(record.kind, &row.target_id, &mapped) {
                    Ok(()) => outcome.updated += 1,
                    Err(e) => outcome.errors.push(ErrorEntry {
                        record_id: e.id,
                        kind: ErrorKind::RemoteWrite,
                        message: e.message,
                    }),
                }
            }
            Resolution::Create => {
                let mapped = mapper.map_fields(record.kind, &record.fields);
                if dry_run {
                    outcome.created += 1;
                    continue;
                }
                match writer.create(record.kind, &mapped) {
                    Ok(_) => outcome.created += 1,
                    Err(e) => outcome.errors.push(ErrorEntry {
                        record_id: e.id,
                        kind: ErrorKind::RemoteWrite,
                        message: e.message,
                    }),
                }
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::test_support::{IdentityMapper, RecordingWriter};
    use crate::model::RecordKind;

    fn src(id: &str, name: &str) -> SourceRecord {
        SourceRecord {
            id: Some(id.into()),
            kind: RecordKind::Server,
            fields: BTreeMap::from([("name".to_string(), name.to_string())]),
            org: "acme".into(),
        }
    }

    fn row(source_id: &str, target_id: &str, resolution: &str) -> ReviewRow {
        ReviewRow {
            source_id: source_id.into(),
            target_id: target_id.into(),
            resolution: resolution.into(),
        }
    }

    #[test]
    fn verdicts_dispatch_to_writer() {
        let source = vec![src("S1", "srv-a"), src("S2", "srv-b"), src("S3", "srv-c")];
        let rows = vec![
            row("S1", "T1", "update"),
            row("S2", "T2", "keep"),
            row("S3", "", "create"),
        ];
        let mut writer = RecordingWriter::default();
        let outcome = apply_resolutions(&rows, &source, &mut writer, &IdentityMapper, false);

        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.kept, 1);
        assert_eq!(outcome.created, 1);
        assert_eq!(writer.updates[0].0, "T1");
        assert_eq!(writer.creates.len(), 1);
    }

    #[test]
    fn blank_and_invalid_rows_skipped() {
        let source = vec![src("S1", "srv-a")];
        let rows = vec![row("S1", "T1", ""), row("S1", "T1", "maybe")];
        let mut writer = RecordingWriter::default();
        let outcome = apply_resolutions(&rows, &source, &mut writer, &IdentityMapper, false);

        assert_eq!(outcome.skipped, 2);
        assert!(writer.updates.is_empty());
    }

    #[test]
    fn resolution_parse_is_case_insensitive() {
        assert_eq!(Resolution::parse(" Update "), Some(Resolution::Update));
        assert_eq!(Resolution::parse("KEEP"), Some(Resolution::Keep));
        assert_eq!(Resolution::parse("nope"), None);
    }

    #[test]
    fn unknown_source_is_error_not_abort() {
        let source = vec![src("S1", "srv-a")];
        let rows = vec![row("S9", "T9", "update"), row("S1", "T1", "update")];
        let mut writer = RecordingWriter::default();
        let outcome = apply_resolutions(&rows, &source, &mut writer, &IdentityMapper, false);

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].record_id, "S9");
        assert_eq!(outcome.updated, 1);
    }

    #[test]
    fn dry_run_counts_without_calls() {
        let source = vec![src("S1", "srv-a")];
        let rows = vec![row("S1", "T1", "update")];
        let mut writer = RecordingWriter::default();
        let outcome = apply_resolutions(&rows, &source, &mut writer, &IdentityMapper, true);

        assert_eq!(outcome.updated, 1);
        assert!(writer.updates.is_empty());
    }
}
