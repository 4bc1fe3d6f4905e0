use std::collections::{BTreeMap, BTreeSet};

use crate::candidates::find_candidates;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::model::{
    DuplicateIdentifierAnomaly, ErrorKind, MatchAction, MatchDecision, MatchTier, Report,
    ReviewItem, SourceRecord, TargetRecord,
};
use crate::normalize::{ineligibility_reason, normalize_fields};
use crate::report::ReportBuilder;
use crate::route::route;
use crate::score::{score_candidates, select_best};

/// Immutable snapshots of both inventories for one run. The engine never
/// re-fetches or observes updates mid-run.
pub struct RunInput {
    pub source: Vec<SourceRecord>,
    pub target: Vec<TargetRecord>,
}

/// Per-run mutable state: the claimed-targets set and the accumulating
/// report. One instance per run, never shared.
struct RunContext {
    claimed: BTreeSet<String>,
    builder: ReportBuilder,
}

fn scope_key(kind: crate::model::RecordKind, org: &str) -> (crate::model::RecordKind, String) {
    (kind, org.trim().to_ascii_lowercase())
}

/// Run the match & deduplication engine over pre-loaded snapshots.
///
/// Source records are processed one at a time in input order; tie-breaking
/// depends on claim state accumulated strictly in that order. Always yields
/// a sealed report when it returns Ok, even if some records errored.
pub fn run(config: &EngineConfig, input: &RunInput) -> Result<Report, EngineError> {
    config.validate()?;

    let mut ctx = RunContext {
        claimed: BTreeSet::new(),
        builder: ReportBuilder::new(),
    };

    // Normalize the target snapshot once and index eligible records by
    // (kind, organization scope). Excluded targets never become candidates.
    let mut target_norms: Vec<BTreeMap<String, String>> = Vec::with_capacity(input.target.len());
    let mut scope_index: BTreeMap<(crate::model::RecordKind, String), Vec<usize>> = BTreeMap::new();

    for (ti, target) in input.target.iter().enumerate() {
        let norm = match config.kinds.get(&target.kind) {
            Some(rules) => normalize_fields(rules, &target.fields),
            None => BTreeMap::new(),
        };
        target_norms.push(norm);

        // A target without its primary key can never be updated and would
        // collide with other blank-id records in the claimed set.
        if target.target_id.trim().is_empty() {
            let label = target
                .fields
                .get("name")
                .map(|n| n.trim())
                .filter(|n| !n.is_empty())
                .unwrap_or("<no id>");
            ctx.builder.push_error(
                label.to_string(),
                ErrorKind::DataQuality,
                "target record missing required field 'target_id'".to_string(),
            );
            continue;
        }

        if ineligibility_reason(config, &target.fields).is_none() {
            scope_index
                .entry(scope_key(target.kind, &target.org))
                .or_default()
                .push(ti);
        } else {
            ctx.builder.count_target_ineligible();
        }
    }

    for source in &input.source {
        process_record(config, source, &input.target, &target_norms, &scope_index, &mut ctx);
    }

    Ok(ctx.builder.seal(config.dry_run))
}

fn process_record(
    config: &EngineConfig,
    source: &SourceRecord,
    targets: &[TargetRecord],
    target_norms: &[BTreeMap<String, String>],
    scope_index: &BTreeMap<(crate::model::RecordKind, String), Vec<usize>>,
    ctx: &mut RunContext,
) {
    let rules = match config.rules_for(source.kind) {
        Ok(rules) => rules,
        Err(err) => {
            ctx.builder.push_error(
                source.display_id().to_string(),
                ErrorKind::DataQuality,
                err.to_string(),
            );
            return;
        }
    };

    if ineligibility_reason(config, &source.fields).is_some() {
        ctx.builder.count_ineligible();
        return;
    }

    let source_norm = normalize_fields(rules, &source.fields);

    // A record with neither a name nor any strong identifier cannot be
    // matched or meaningfully created.
    let has_name = source_norm
        .get(&rules.name_field)
        .is_some_and(|n| !n.is_empty());
    let has_identifier = rules
        .identifiers
        .iter()
        .any(|f| source_norm.get(f).is_some_and(|v| !v.is_empty()));
    if !has_name && !has_identifier {
        ctx.builder.push_error(
            source.display_id().to_string(),
            ErrorKind::DataQuality,
            "missing required identifying fields (no name, no identifier)".to_string(),
        );
        return;
    }

    let source_name = source
        .fields
        .get(&rules.name_field)
        .map(|n| n.trim().to_string())
        .unwrap_or_default();

    let empty = Vec::new();
    let scope = scope_index
        .get(&scope_key(source.kind, &source.org))
        .unwrap_or(&empty);

    let set = find_candidates(rules, config.fuzzy_floor, &source_norm, target_norms, scope);

    if let Some((field, value)) = &set.duplicate_identifier {
        ctx.builder.push_anomaly(DuplicateIdentifierAnomaly {
            source_id: source.id.clone(),
            field: field.clone(),
            value: value.clone(),
            target_ids: set
                .candidates
                .iter()
                .map(|c| targets[c.target_index].target_id.clone())
                .collect(),
        });
    }

    if set.candidates.is_empty() {
        ctx.builder.push_decision(MatchDecision {
            source_id: source.id.clone(),
            source_name,
            kind: source.kind,
            action: MatchAction::CreateNew,
            target_id: None,
            score: 0.0,
            reasons: vec!["no candidate found".to_string()],
            source_fields: source.fields.clone(),
        });
        return;
    }

    let scored = score_candidates(rules, &source_norm, target_norms, &set);
    let best = match select_best(&scored, targets, &ctx.claimed) {
        Some(best) => best,
        None => {
            // Everything this record could match was claimed earlier.
            ctx.builder.push_decision(MatchDecision {
                source_id: source.id.clone(),
                source_name,
                kind: source.kind,
                action: MatchAction::CreateNew,
                target_id: None,
                score: 0.0,
                reasons: vec!["all candidates claimed by earlier records".to_string()],
                source_fields: source.fields.clone(),
            });
            return;
        }
    };

    let target = &targets[best.target_index];
    let action = route(&config.thresholds, best.score, true);

    let mut reasons = Vec::new();
    match best.tier {
        MatchTier::Identifier if set.duplicate_identifier.is_none() => {
            reasons.push("identifier match".to_string());
        }
        MatchTier::Identifier => {
            reasons.push("identifier match (duplicate identifiers in target)".to_string());
        }
        MatchTier::ExactName => reasons.push("matched by exact name".to_string()),
        MatchTier::FuzzyName => reasons.push("matched by fuzzy name".to_string()),
    }
    reasons.push(format!("confidence {:.3}", best.score));

    let (target_id, claimed_target) = match action {
        MatchAction::CreateNew => (None, false),
        _ => (Some(target.target_id.clone()), true),
    };

    if claimed_target {
        ctx.claimed.insert(target.target_id.clone());
    }

    if action == MatchAction::ManualReview {
        ctx.builder.push_review_item(ReviewItem {
            kind: source.kind,
            score: best.score,
            source_id: source.id.clone(),
            source_fields: source.fields.clone(),
            target_id: target.target_id.clone(),
            target_fields: target.fields.clone(),
            per_field: best.per_field.clone(),
            resolution: None,
        });
    }

    ctx.builder.push_decision(MatchDecision {
        source_id: source.id.clone(),
        source_name,
        kind: source.kind,
        action,
        target_id,
        score: best.score,
        reasons,
        source_fields: source.fields.clone(),
    });
}
