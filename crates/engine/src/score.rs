use std::collections::{BTreeMap, BTreeSet};

use crate::candidates::CandidateSet;
use crate::config::KindRules;
use crate::model::{MatchCandidate, MatchTier, TargetRecord};
use crate::similarity::similarity;

/// Weighted confidence score for one pairing, plus the per-field breakdown.
///
/// A field contributes only when present (non-empty) on both sides, so
/// sparse data is not penalized as a mismatch. score = weighted sum over
/// contributing fields / sum of their weights; 0.0 when nothing contributes.
pub fn score_pair(
    rules: &KindRules,
    source_norm: &BTreeMap<String, String>,
    target_norm: &BTreeMap<String, String>,
) -> (f64, BTreeMap<String, f64>) {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut per_field = BTreeMap::new();

    for (field, rule) in &rules.fields {
        let a = source_norm.get(field).map(String::as_str).unwrap_or("");
        let b = target_norm.get(field).map(String::as_str).unwrap_or("");
        if a.is_empty() || b.is_empty() {
            continue;
        }

        let sim = similarity(rule.comparator, a, b);
        per_field.insert(field.clone(), sim);
        numerator += rule.weight * sim;
        denominator += rule.weight;
    }

    if denominator == 0.0 {
        return (0.0, per_field);
    }

    ((numerator / denominator).clamp(0.0, 1.0), per_field)
}

/// Score every candidate the tier chain produced. A sole, unambiguous
/// identifier hit is definitive: score forced to 1.0. Duplicate identifier
/// hits fall through to full scoring.
pub fn score_candidates(
    rules: &KindRules,
    source_norm: &BTreeMap<String, String>,
    target_norms: &[BTreeMap<String, String>],
    set: &CandidateSet,
) -> Vec<MatchCandidate> {
    let sole_identifier =
        set.candidates.len() == 1 && set.candidates[0].tier == MatchTier::Identifier;

    set.candidates
        .iter()
        .map(|c| {
            let (score, per_field) = score_pair(rules, source_norm, &target_norms[c.target_index]);
            MatchCandidate {
                target_index: c.target_index,
                tier: c.tier,
                score: if sole_identifier { 1.0 } else { score },
                per_field,
            }
        })
        .collect()
}

/// Pick the winning candidate. Targets claimed by an earlier source record
/// are excluded outright (first claim wins); remaining ties break by
/// earliest tier, then lexicographically smallest target id.
pub fn select_best<'a>(
    candidates: &'a [MatchCandidate],
    targets: &[TargetRecord],
    claimed: &BTreeSet<String>,
) -> Option<&'a MatchCandidate> {
    candidates
        .iter()
        .filter(|c| !claimed.contains(&targets[c.target_index].target_id))
        .min_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.tier.cmp(&b.tier))
                .then(targets[a.target_index].target_id.cmp(&targets[b.target_index].target_id))
        })
}
