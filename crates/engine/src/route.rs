use crate::config::Thresholds;
use crate::model::MatchAction;

/// Classify a scored pairing. Pure function of the score and thresholds;
/// boundary scores route upward (>= on both cut points).
pub fn route(thresholds: &Thresholds, score: f64, has_candidate: bool) -> MatchAction {
    if !has_candidate {
        return MatchAction::CreateNew;
    }

    if score >= thresholds.high {
        MatchAction::AutoUpdate
    } else if score >= thresholds.medium {
        MatchAction::ManualReview
    } else {
        MatchAction::CreateNew
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Thresholds {
        Thresholds { high: 0.8, medium: 0.6 }
    }

    #[test]
    fn no_candidate_is_unconditional_create() {
        assert_eq!(route(&defaults(), 1.0, false), MatchAction::CreateNew);
    }

    #[test]
    fn boundary_scores_route_upward() {
        let t = defaults();
        assert_eq!(route(&t, 0.8, true), MatchAction::AutoUpdate);
        assert_eq!(route(&t, 0.6, true), MatchAction::ManualReview);
        assert_eq!(route(&t, 0.6 - 1e-9, true), MatchAction::CreateNew);
    }

    #[test]
    fn interval_routing() {
        let t = defaults();
        assert_eq!(route(&t, 0.95, true), MatchAction::AutoUpdate);
        assert_eq!(route(&t, 0.7, true), MatchAction::ManualReview);
        assert_eq!(route(&t, 0.2, true), MatchAction::CreateNew);
        assert_eq!(route(&t, 0.0, true), MatchAction::CreateNew);
    }
}
