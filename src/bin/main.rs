//! Thin CLI entry point around the alert-correlation pipeline library.
//!
//! Reads a file or directory of raw vendor alert records, runs the batch
//! pipeline, and writes the output record stream to stdout (or a file with
//! `--out`). Ingestion and wire-format detection live here rather than in
//! the library, same split the library's tests assume.

use alert_correlator::config::RunConfig;
use alert_correlator::types::ExternalGraph;
use alert_correlator::{Pipeline, PipelineError};
use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "alert-correlator")]
#[command(about = "Batch alert correlation and primary-cause analysis")]
#[command(version)]
struct CliArgs {
    /// File or directory of raw alert records (.json, .jsonl, .ndjson).
    input: PathBuf,

    /// Write the output record stream here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Path to an optional external entity-adjacency graph document.
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Dedup window, in seconds.
    #[arg(long)]
    dedup_ttl: Option<i64>,

    /// Episode split threshold, in seconds.
    #[arg(long)]
    episode_gap: Option<i64>,

    /// Lead-lag search bound, in seconds.
    #[arg(long)]
    max_lag: Option<i64>,

    /// Minimum co-occurrence / aligned-burst count for emission.
    #[arg(long)]
    min_support: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    if !args.input.exists() {
        return Err(PipelineError::MissingInput(args.input.display().to_string()).into());
    }

    let mut run_config = RunConfig::load();
    if let Some(v) = args.dedup_ttl {
        run_config.dedup_ttl_sec = v;
    }
    if let Some(v) = args.episode_gap {
        run_config.episode_gap_sec = v;
    }
    if let Some(v) = args.max_lag {
        run_config.max_lag_sec = v;
    }
    if let Some(v) = args.min_support {
        run_config.min_support = v;
    }
    if args.graph.is_some() {
        run_config.graph = args.graph.clone();
    }

    let (graph, graph_provided) = load_graph(run_config.graph.as_deref())?;

    let raw_alerts = load_alerts(&args.input)?;
    info!(count = raw_alerts.len(), path = %args.input.display(), "loaded raw alerts");

    let pipeline = Pipeline::new(run_config, graph, graph_provided);
    let now_ms = chrono::Utc::now().timestamp_millis();
    let generated_at = alert_correlator::util::iso8601_utc(now_ms);
    let input_dir = args.input.display().to_string();

    let counters = match &args.out {
        Some(path) => {
            let file = fs::File::create(path)
                .with_context(|| format!("failed to create output file {}", path.display()))?;
            pipeline.run(&raw_alerts, &input_dir, now_ms, generated_at, file)
        }
        None => pipeline.run(&raw_alerts, &input_dir, now_ms, generated_at, io::stdout().lock()),
    }
    .map_err(anyhow::Error::from)?;

    info!(
        situations = counters.situations_created,
        correlations = counters.correlations_found,
        "run complete"
    );

    Ok(())
}

/// Load an external adjacency graph document. Absence (no path configured,
/// or a load failure) degrades to an empty graph with a warning, never
/// aborts the run — mirrors `original_source/engine.py`'s `_load_graph`.
fn load_graph(path: Option<&Path>) -> Result<(ExternalGraph, bool)> {
    let Some(path) = path else {
        return Ok((ExternalGraph::default(), false));
    };

    let raw = fs::read_to_string(path).map_err(|source| PipelineError::GraphLoad {
        path: path.display().to_string(),
        source,
    })?;
    let graph: ExternalGraph = serde_json::from_str(&raw).map_err(|source| PipelineError::GraphParse {
        path: path.display().to_string(),
        source,
    })?;
    Ok((graph, true))
}

/// Load raw alert records from a single file or every recognized file in a
/// directory. A record or file that fails to parse is logged and skipped,
/// never aborts the run.
fn load_alerts(input: &Path) -> Result<Vec<Value>> {
    if input.is_dir() {
        let mut records = Vec::new();
        let mut entries: Vec<PathBuf> = fs::read_dir(input)
            .with_context(|| format!("failed to read directory {}", input.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        entries.sort();
        for path in entries {
            if path.is_file() {
                records.extend(load_file(&path));
            }
        }
        Ok(records)
    } else {
        Ok(load_file(input))
    }
}

fn load_file(path: &Path) -> Vec<Value> {
    let Ok(contents) = fs::read_to_string(path) else {
        warn!(path = %path.display(), "failed to read input file, skipping");
        return Vec::new();
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") | Some("ndjson") => contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str(line) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unparsable line");
                    None
                }
            })
            .collect(),
        Some("json") => match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Array(items)) => items,
            Ok(Value::Object(mut obj)) => match obj.remove("data") {
                Some(Value::Array(items)) => items,
                _ => vec![Value::Object(obj)],
            },
            Ok(other) => vec![other],
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unparsable file");
                Vec::new()
            }
        },
        _ => {
            warn!(path = %path.display(), "unrecognized file extension, skipping");
            Vec::new()
        }
    }
}
