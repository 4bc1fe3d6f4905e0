use std::collections::BTreeMap;

use crate::config::{Comparator, KindRules};
use crate::model::MatchTier;
use crate::similarity::similarity;

/// A target discovered by the tier chain, before scoring.
#[derive(Debug, Clone, Copy)]
pub struct TierCandidate {
    pub target_index: usize,
    pub tier: MatchTier,
}

#[derive(Debug, Default)]
pub struct CandidateSet {
    pub candidates: Vec<TierCandidate>,
    /// Set when one identifier value hit more than one target: a data-quality
    /// anomaly, resolved by full scoring instead of auto-match.
    pub duplicate_identifier: Option<(String, String)>,
}

/// Three-tier resolution chain over the in-scope target indices, stopping at
/// the first tier that yields any candidate. Scope (same organization, same
/// kind, eligible) is enforced by the caller; candidates outside it are never
/// seen here.
pub fn find_candidates(
    rules: &KindRules,
    fuzzy_floor: f64,
    source_norm: &BTreeMap<String, String>,
    target_norms: &[BTreeMap<String, String>],
    scope: &[usize],
) -> CandidateSet {
    let mut set = CandidateSet::default();

    // Tier 1: strong-identifier equality, union across configured identifiers.
    for field in &rules.identifiers {
        let value = match source_norm.get(field) {
            Some(v) if !v.is_empty() => v,
            _ => continue,
        };

        let mut hits = 0usize;
        for &ti in scope {
            if target_norms[ti].get(field) == Some(value)
                && !set.candidates.iter().any(|c| c.target_index == ti)
            {
                set.candidates.push(TierCandidate {
                    target_index: ti,
                    tier: MatchTier::Identifier,
                });
                hits += 1;
            }
        }
        if hits > 1 && set.duplicate_identifier.is_none() {
            set.duplicate_identifier = Some((field.clone(), value.clone()));
        }
    }
    if !set.candidates.is_empty() {
        return set;
    }

    let source_name = match source_norm.get(&rules.name_field) {
        Some(n) if !n.is_empty() => n,
        _ => return set,
    };

    // Tier 2: exact normalized name (organization scope already applied).
    for &ti in scope {
        if target_norms[ti].get(&rules.name_field) == Some(source_name) {
            set.candidates.push(TierCandidate {
                target_index: ti,
                tier: MatchTier::ExactName,
            });
        }
    }
    if !set.candidates.is_empty() {
        return set;
    }

    // Tier 3: fuzzy name above the configured floor.
    for &ti in scope {
        let target_name = match target_norms[ti].get(&rules.name_field) {
            Some(n) if !n.is_empty() => n,
            _ => continue,
        };
        if similarity(Comparator::Fuzzy, source_name, target_name) >= fuzzy_floor {
            set.candidates.push(TierCandidate {
                target_index: ti,
                tier: MatchTier::FuzzyName,
            });
        }
    }

    set
}
