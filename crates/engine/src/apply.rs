use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::model::{ErrorEntry, ErrorKind, MatchAction, RecordKind, Report};

// ---------------------------------------------------------------------------
// Collaborator contracts
// ---------------------------------------------------------------------------

/// The target system rejected a create/update. Recorded per record; never
/// aborts the apply loop.
#[derive(Debug, Clone)]
pub struct RemoteWriteError {
    pub id: String,
    pub kind: RecordKind,
    pub message: String,
}

impl fmt::Display for RemoteWriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "remote write failed for {} '{}': {}", self.kind, self.id, self.message)
    }
}

impl std::error::Error for RemoteWriteError {}

/// Write contract of the target inventory. Transport is a collaborator
/// concern; the engine only sees this interface.
pub trait TargetWriter {
    fn create(
        &mut self,
        kind: RecordKind,
        fields: &BTreeMap<String, String>,
    ) -> Result<String, RemoteWriteError>;

    fn update(
        &mut self,
        kind: RecordKind,
        target_id: &str,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), RemoteWriteError>;
}

/// Translates source fields to the target system's schema immediately before
/// a write. Output is opaque to the engine.
pub trait FieldMapper {
    fn map_fields(
        &self,
        kind: RecordKind,
        fields: &BTreeMap<String, String>,
    ) -> BTreeMap<String, String>;
}

// ---------------------------------------------------------------------------
// Applier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyOutcome {
    pub updated: usize,
    pub created: usize,
    pub skipped_review: usize,
    pub errors: Vec<ErrorEntry>,
    pub dry_run: bool,
}

/// Apply a sealed report's decisions to the target inventory: one update per
/// auto_update, one create per create_new. Manual-review decisions are never
/// auto-applied. In dry-run mode the outcome is identical but no writer call
/// is issued.
pub fn apply(
    report: &Report,
    writer: &mut dyn TargetWriter,
    mapper: &dyn FieldMapper,
    dry_run: bool,
) -> ApplyOutcome {
    let mut outcome = ApplyOutcome {
        dry_run,
        ..ApplyOutcome::default()
    };

    for decision in &report.decisions {
        match decision.action {
            MatchAction::ManualReview => outcome.skipped_review += 1,
            MatchAction::AutoUpdate => {
                let target_id = match &decision.target_id {
                    Some(id) => id,
                    None => continue,
                };
                let mapped = mapper.map_fields(decision.kind, &decision.source_fields);
                if dry_run {
                    outcome.updated += 1;
                    continue;
                }
                match writer.update(decision.kind, target_id, &mapped) {
                    Ok(()) => outcome.updated += 1,
                    Err(e) => outcome.errors.push(ErrorEntry {
                        record_id: e.id,
                        kind: ErrorKind::RemoteWrite,
                        message: e.message,
                    }),
                }
            }
            MatchAction::CreateNew => {
                let mapped = mapper.map_fields(decision.kind, &decision.source_fields);
                if dry_run {
                    outcome.created += 1;
                    continue;
                }
                match writer.create(decision.kind, &mapped) {
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

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------


#[cfg(test)]
mod tests {
    use super::test_support::{IdentityMapper, RecordingWriter};
    use super::*;
    use crate::model::{MatchDecision, ReportCounts, ReportMeta};

    fn decision(action: MatchAction, target_id: Option<&str>, name: &str) -> MatchDecision {
        MatchDecision {
            source_id: Some(format!("S-{name}")),
            source_name: name.into(),
            kind: RecordKind::Server,
            action,
            target_id: target_id.map(String::from),
            score: 0.9,
            reasons: vec![],
            source_fields: BTreeMap::from([("name".to_string(), name.to_string())]),
        }
    }

    fn report(decisions: Vec<MatchDecision>) -> Report {
        Report {
            meta: ReportMeta {
                engine_version: "test".into(),
                run_at: "2026-01-01T00:00:00Z".into(),
                dry_run: false,
            },
            counts: ReportCounts::default(),
            decisions,
            review_queue: vec![],
            errors: vec![],
            anomalies: vec![],
        }
    }

    #[test]
    fn applies_updates_and_creates_skips_review() {
        let report = report(vec![
            decision(MatchAction::AutoUpdate, Some("T1"), "srv-a"),
            decision(MatchAction::ManualReview, Some("T2"), "srv-b"),
            decision(MatchAction::CreateNew, None, "srv-c"),
        ]);
        let mut writer = RecordingWriter::default();
        let outcome = apply(&report, &mut writer, &IdentityMapper, false);

        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.skipped_review, 1);
        assert!(outcome.errors.is_empty());
        assert_eq!(writer.updates.len(), 1);
        assert_eq!(writer.updates[0].0, "T1");
        assert_eq!(writer.creates.len(), 1);
    }

    #[test]
    fn dry_run_issues_zero_writer_calls() {
        let report = report(vec![
            decision(MatchAction::AutoUpdate, Some("T1"), "srv-a"),
            decision(MatchAction::CreateNew, None, "srv-c"),
        ]);
        let mut writer = RecordingWriter::default();
        let outcome = apply(&report, &mut writer, &IdentityMapper, true);

        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.created, 1);
        assert!(outcome.dry_run);
        assert!(writer.updates.is_empty());
        assert!(writer.creates.is_empty());
    }

    #[test]
    fn write_failure_recorded_not_fatal() {
        let report = report(vec![
            decision(MatchAction::AutoUpdate, Some("T1"), "srv-a"),
            decision(MatchAction::AutoUpdate, Some("T2"), "srv-b"),
        ]);
        let mut writer = RecordingWriter {
            fail_on: vec!["T1".into()],
            ..RecordingWriter::default()
        };
        let outcome = apply(&report, &mut writer, &IdentityMapper, false);

        // T1 failed, T2 still went through.
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].record_id, "T1");
        assert_eq!(outcome.errors[0].kind, ErrorKind::RemoteWrite);
        assert_eq!(writer.updates[0].0, "T2");
    }
}
