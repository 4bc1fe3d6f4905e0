use crate::model::{
    DuplicateIdentifierAnomaly, ErrorEntry, ErrorKind, MatchAction, MatchDecision, Report,
    ReportCounts, ReportMeta, ReviewItem,
};

/// Accumulates run output in processing order, then seals into an immutable
/// `Report`. Counts are derived once at seal time from the decision list so
/// they always reflect it.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    decisions: Vec<MatchDecision>,
    review_queue: Vec<ReviewItem>,
    errors: Vec<ErrorEntry>,
    anomalies: Vec<DuplicateIdentifierAnomaly>,
    ineligible: usize,
    target_ineligible: usize,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_decision(&mut self, decision: MatchDecision) {
        self.decisions.push(decision);
    }

    pub fn push_review_item(&mut self, item: ReviewItem) {
        self.review_queue.push(item);
    }

    pub fn push_error(&mut self, record_id: String, kind: ErrorKind, message: String) {
        self.errors.push(ErrorEntry { record_id, kind, message });
    }

    pub fn push_anomaly(&mut self, anomaly: DuplicateIdentifierAnomaly) {
        self.anomalies.push(anomaly);
    }

    pub fn count_ineligible(&mut self) {
        self.ineligible += 1;
    }

    pub fn count_target_ineligible(&mut self) {
        self.target_ineligible += 1;
    }

    pub fn seal(self, dry_run: bool) -> Report {
        let mut counts = ReportCounts {
            ineligible: self.ineligible,
            target_ineligible: self.target_ineligible,
            error: self.errors.len(),
            ..ReportCounts::default()
        };
        for decision in &self.decisions {
            match decision.action {
                MatchAction::AutoUpdate => counts.auto_update += 1,
                MatchAction::ManualReview => counts.manual_review += 1,
                MatchAction::CreateNew => counts.create_new += 1,
            }
        }

        Report {
            meta: ReportMeta {
                engine_version: env!("CARGO_PKG_VERSION").to_string(),
                run_at: chrono::Utc::now().to_rfc3339(),
                dry_run,
            },
            counts,
            decisions: self.decisions,
            review_queue: self.review_queue,
            errors: self.errors,
            anomalies: self.anomalies,
        }
    }
}
