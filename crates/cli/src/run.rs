//! `xwalk run` / `xwalk validate` — config-driven match & dedup runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use crosswalk_engine::apply::{apply, RemoteWriteError, TargetWriter};
use crosswalk_engine::engine::{run, RunInput};
use crosswalk_engine::model::{RecordKind, Report, ReviewItem, SourceRecord, TargetRecord};
use crosswalk_engine::readers::{SourceReader, TargetReader};
use crosswalk_engine::EngineConfig;
use crosswalk_inventory::{
    load_source_snapshot, load_target_snapshot, write_report, MapperConfig, SourceClient,
    SourceSettings, TargetClient, TargetSettings,
};
use serde::Deserialize;

use crate::exit_codes::EXIT_APPLY_ERRORS;
use crate::CliError;

// ── Config ──────────────────────────────────────────────────────────

/// Top-level CLI config: engine rules plus both inventory connections and
/// the field mapper. Snapshot paths are resolved relative to the config file.
#[derive(Debug, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    pub source: SourceSettings,
    pub target: TargetSettings,
    #[serde(default)]
    pub mapper: MapperConfig,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::usage(format!("cannot read {}: {e}", path.display())))?;
        let config: RunConfig =
            toml::from_str(&text).map_err(|e| CliError::config(e.to_string()))?;
        config
            .engine
            .validate()
            .map_err(|e| CliError::config(e.to_string()))?;
        Ok(config)
    }
}

// ── Snapshot / API loading ──────────────────────────────────────────

pub fn load_source(config: &RunConfig, base_dir: &Path) -> Result<Vec<SourceRecord>, CliError> {
    if let Some(snapshot) = &config.source.snapshot {
        return load_source_snapshot(&base_dir.join(snapshot))
            .map_err(|e| CliError::runtime(e.to_string()));
    }

    let client =
        SourceClient::from_settings(&config.source).map_err(|e| CliError::config(e.to_string()))?;
    let mut records = Vec::new();
    for kind in config.engine.kinds.keys() {
        records.extend(
            client
                .list(*kind, None)
                .map_err(|e| CliError::runtime(e.to_string()))?,
        );
    }
    Ok(records)
}

pub fn load_target(config: &RunConfig, base_dir: &Path) -> Result<Vec<TargetRecord>, CliError> {
    if let Some(snapshot) = &config.target.snapshot {
        return load_target_snapshot(&base_dir.join(snapshot))
            .map_err(|e| CliError::runtime(e.to_string()));
    }

    let client =
        TargetClient::from_settings(&config.target).map_err(|e| CliError::config(e.to_string()))?;
    let mut records = Vec::new();
    for kind in config.engine.kinds.keys() {
        records.extend(
            client
                .list(*kind, None)
                .map_err(|e| CliError::runtime(e.to_string()))?,
        );
    }
    Ok(records)
}

/// Satisfies the writer contract for dry runs, where no call is ever issued.
pub struct NoopWriter;

impl TargetWriter for NoopWriter {
    fn create(
        &mut self,
        _kind: RecordKind,
        _fields: &BTreeMap<String, String>,
    ) -> Result<String, RemoteWriteError> {
        Ok(String::new())
    }

    fn update(
        &mut self,
        _kind: RecordKind,
        _target_id: &str,
        _fields: &BTreeMap<String, String>,
    ) -> Result<(), RemoteWriteError> {
        Ok(())
    }
}

// ── run ─────────────────────────────────────────────────────────────

pub fn cmd_run(
    config_path: PathBuf,
    dry_run: bool,
    apply_writes: bool,
    json_output: bool,
    output_dir: PathBuf,
) -> Result<(), CliError> {
    let mut config = RunConfig::load(&config_path)?;
    config.engine.dry_run = config.engine.dry_run || dry_run;
    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let input = RunInput {
        source: load_source(&config, base_dir)?,
        target: load_target(&config, base_dir)?,
    };
    let total = input.source.len();

    let report = run(&config.engine, &input).map_err(|e| CliError::runtime(e.to_string()))?;

    std::fs::create_dir_all(&output_dir)
        .map_err(|e| CliError::runtime(format!("{}: {e}", output_dir.display())))?;
    let ts = Utc::now().format("%Y%m%dT%H%M%SZ");

    let report_path = output_dir.join(format!("report_{ts}.json"));
    write_report(&report_path, &report).map_err(|e| CliError::runtime(e.to_string()))?;
    eprintln!("wrote {}", report_path.display());

    if !report.review_queue.is_empty() {
        let review_path = output_dir.join(format!("manual_review_{ts}.csv"));
        write_review_csv(&review_path, &report.review_queue)?;
        eprintln!("wrote {}", review_path.display());
    }

    if json_output {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::runtime(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    print_run_summary(total, &report);

    if apply_writes || config.engine.dry_run {
        let outcome = if config.engine.dry_run {
            apply(&report, &mut NoopWriter, &config.mapper, true)
        } else {
            let mut writer = TargetClient::from_settings(&config.target)
                .map_err(|e| CliError::config(e.to_string()))?;
            apply(&report, &mut writer, &config.mapper, false)
        };

        eprintln!(
            "apply{}: {} updated, {} created, {} held for review, {} errors",
            if outcome.dry_run { " (dry-run)" } else { "" },
            outcome.updated,
            outcome.created,
            outcome.skipped_review,
            outcome.errors.len(),
        );

        if !outcome.errors.is_empty() {
            return Err(CliError {
                code: EXIT_APPLY_ERRORS,
                message: format!("{} write(s) rejected by the target system", outcome.errors.len()),
                hint: Some("see the errors section of the report JSON".into()),
            });
        }
    }

    Ok(())
}

fn print_run_summary(total: usize, report: &Report) {
    let c = &report.counts;
    eprintln!(
        "match run: {} source records — {} auto_update, {} manual_review, {} create_new, {} ineligible, {} errors",
        total, c.auto_update, c.manual_review, c.create_new, c.ineligible, c.error,
    );
    if !report.anomalies.is_empty() {
        eprintln!("warning: {} duplicate-identifier anomalies in target data", report.anomalies.len());
    }
}

// ── validate ────────────────────────────────────────────────────────

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let config = RunConfig::load(&config_path)?;
    eprintln!(
        "config OK: {} kinds, thresholds high={} medium={}, fuzzy floor {}",
        config.engine.kinds.len(),
        config.engine.thresholds.high,
        config.engine.thresholds.medium,
        config.engine.fuzzy_floor,
    );
    Ok(())
}

// ── review queue CSV ────────────────────────────────────────────────

pub const REVIEW_HEADERS: [&str; 7] = [
    "kind",
    "score",
    "source_id",
    "source_name",
    "target_id",
    "target_name",
    "resolution",
];

fn write_review_csv(path: &Path, items: &[ReviewItem]) -> Result<(), CliError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| CliError::runtime(format!("{}: {e}", path.display())))?;
    writer
        .write_record(REVIEW_HEADERS)
        .map_err(|e| CliError::runtime(e.to_string()))?;

    for item in items {
        let record = [
            item.kind.to_string(),
            format!("{:.3}", item.score),
            item.source_id.clone().unwrap_or_default(),
            item.source_fields.get("name").cloned().unwrap_or_default(),
            item.target_id.clone(),
            item.target_fields.get("name").cloned().unwrap_or_default(),
            String::new(),
        ];
        writer
            .write_record(&record)
            .map_err(|e| CliError::runtime(e.to_string()))?;
    }

    writer.flush().map_err(|e| CliError::runtime(e.to_string()))
}
