//! `xwalk review apply` — ingest reviewer verdicts from an edited CSV.

use std::path::{Path, PathBuf};

use crosswalk_engine::review::{apply_resolutions, ReviewRow};
use crosswalk_inventory::TargetClient;

use crate::exit_codes::EXIT_APPLY_ERRORS;
use crate::run::{load_source, NoopWriter, RunConfig};
use crate::CliError;

pub fn cmd_review_apply(
    config_path: PathBuf,
    csv_path: PathBuf,
    dry_run: bool,
) -> Result<(), CliError> {
    let config = RunConfig::load(&config_path)?;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let effective_dry = dry_run || config.engine.dry_run;

    let rows = read_review_csv(&csv_path)?;
    let source = load_source(&config, base_dir)?;

    let outcome = if effective_dry {
        apply_resolutions(&rows, &source, &mut NoopWriter, &config.mapper, true)
    } else {
        let mut writer = TargetClient::from_settings(&config.target)
            .map_err(|e| CliError::config(e.to_string()))?;
        apply_resolutions(&rows, &source, &mut writer, &config.mapper, false)
    };

    eprintln!(
        "review apply{}: {} updated, {} kept, {} created, {} skipped, {} errors",
        if outcome.dry_run { " (dry-run)" } else { "" },
        outcome.updated,
        outcome.kept,
        outcome.created,
        outcome.skipped,
        outcome.errors.len(),
    );

    if !outcome.errors.is_empty() {
        for err in &outcome.errors {
            eprintln!("  {}: {}", err.record_id, err.message);
        }
        return Err(CliError {
            code: EXIT_APPLY_ERRORS,
            message: format!("{} verdict(s) failed", outcome.errors.len()),
            hint: None,
        });
    }

    Ok(())
}

/// Parse an exported review CSV back into verdict rows. Columns are located
/// by header name so reviewers can reorder or add columns in a spreadsheet.
fn read_review_csv(path: &Path) -> Result<Vec<ReviewRow>, CliError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| CliError::usage(format!("cannot read {}: {e}", path.display())))?;

    let headers = reader
        .headers()
        .map_err(|e| CliError::usage(e.to_string()))?
        .clone();
    let col = |name: &str| -> Result<usize, CliError> {
        headers.iter().position(|h| h == name).ok_or_else(|| {
            CliError::usage(format!("review CSV is missing the '{name}' column"))
                .with_hint("export the queue with `xwalk run` and edit the resolution column")
        })
    };
    let source_id = col("source_id")?;
    let target_id = col("target_id")?;
    let resolution = col("resolution")?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| CliError::usage(e.to_string()))?;
        rows.push(ReviewRow {
            source_id: record.get(source_id).unwrap_or_default().to_string(),
            target_id: record.get(target_id).unwrap_or_default().to_string(),
            resolution: record.get(resolution).unwrap_or_default().to_string(),
        });
    }

    Ok(rows)
}
