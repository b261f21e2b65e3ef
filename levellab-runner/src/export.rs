//! Report persistence: JSON reports and CSV tables.
//!
//! Every run directory holds:
//! - `report.json`: the full `SearchReport`
//! - `candidates.csv`: every evaluated candidate
//! - `signals.csv`: the best parameters' signalled run (when one scored)
//!
//! Reports carry a `schema_version`; newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use levellab_core::scoring::ScoredRun;

use crate::config::is_valid_symbol;
use crate::result::Evaluation;
use crate::search::{SearchReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &SearchReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SearchReport to JSON")
}

/// Deserialize a `SearchReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SearchReport> {
    let report: SearchReport =
        serde_json::from_str(json).context("failed to deserialize SearchReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: window_size, bias, score. Unscored candidates leave `score` empty.
pub fn export_candidates_csv(candidates: &[Evaluation]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["window_size", "bias", "score"])?;
    for e in candidates {
        let score = e.result().map(|r| format!("{:.6}", r.score)).unwrap_or_default();
        wtr.write_record([
            &e.params.window_size.to_string(),
            &e.params.bias.to_string(),
            &score,
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: time, open, high, low, close, rolling_max, rolling_min, signal,
/// price_change, accumulated_price_change.
pub fn export_signals_csv(run: &ScoredRun) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "time",
        "open",
        "high",
        "low",
        "close",
        "rolling_max",
        "rolling_min",
        "signal",
        "price_change",
        "accumulated_price_change",
    ])?;

    for row in &run.rows {
        let b = &row.bar;
        wtr.write_record([
            &b.bar.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            &format!("{:.6}", b.bar.open),
            &format!("{:.6}", b.bar.high),
            &format!("{:.6}", b.bar.low),
            &format!("{:.6}", b.bar.close),
            &format!("{:.6}", b.levels.rolling_max),
            &format!("{:.6}", b.levels.rolling_min),
            &b.signal.as_str().to_string(),
            &row.price_change.map(|p| format!("{:.6}", p)).unwrap_or_default(),
            &format!("{:.6}", row.accumulated_price_change),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save a run's artifacts under `output_dir/{symbol}_{config_hash}/`.
///
/// The directory name depends only on the symbol and config hash, so a
/// repeated run overwrites its own artifacts. Returns the directory path.
pub fn save_artifacts(
    report: &SearchReport,
    best_run: Option<&ScoredRun>,
    output_dir: &Path,
) -> Result<PathBuf> {
    if !is_valid_symbol(&report.symbol) {
        bail!("symbol {:?} cannot name an artifact directory", report.symbol);
    }
    let hash: String = report.config_hash.chars().take(12).collect();
    let run_dir = output_dir.join(format!("{}_{}", report.symbol, hash));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(report)?;
    std::fs::write(run_dir.join("report.json"), &json)?;

    let candidates_csv = export_candidates_csv(&report.candidates)?;
    std::fs::write(run_dir.join("candidates.csv"), &candidates_csv)?;

    if let Some(run) = best_run {
        let signals_csv = export_signals_csv(run)?;
        std::fs::write(run_dir.join("signals.csv"), &signals_csv)?;
    }

    Ok(run_dir)
}

/// Load a `SearchReport` from an artifact directory's report.json.
pub fn load_report(run_dir: &Path) -> Result<SearchReport> {
    let path = run_dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
