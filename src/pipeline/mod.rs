//! Wires every stage together into one run: one struct owning the run,
//! stages invoked in sequence, counters threaded through to a final
//! summary record.

use crate::cause_selector;
use crate::config::RunConfig;
use crate::correlation_engine;
use crate::emitter::{Emitter, RunMeta};
use crate::episode_builder;
use crate::error::PipelineError;
use crate::noise_filter::NoiseFilter;
use crate::normalizer::normalize_batch;
use crate::situation_assembler;
use crate::temporal_spreader;
use crate::types::{CorrelationRecord, ExternalGraph, Situation};
use rayon::prelude::*;
use serde_json::Value;
use std::io::Write;
use tracing::info;

/// Owns one end-to-end run of the pipeline.
pub struct Pipeline {
    config: RunConfig,
    graph: ExternalGraph,
    graph_provided: bool,
}

/// Aggregate counters surfaced on the `run_meta` record.
#[derive(Debug, Default)]
pub struct RunCounters {
    pub raw_alerts: usize,
    pub processed_alerts: usize,
    pub episodes_created: usize,
    pub situations_created: usize,
    pub correlations_found: usize,
}

impl Pipeline {
    pub fn new(config: RunConfig, graph: ExternalGraph, graph_provided: bool) -> Self {
        Self { config, graph, graph_provided }
    }

    /// Run the pipeline over `raw_alerts` (already deserialized JSON records)
    /// and write the record stream to `out`. `now_ms` is threaded into the
    /// Normalizer so the whole run stays deterministic under test.
    pub fn run<W: Write>(
        &self,
        raw_alerts: &[Value],
        input_dir: &str,
        now_ms: i64,
        generated_at: String,
        out: W,
    ) -> Result<RunCounters, PipelineError> {
        let mut counters = RunCounters { raw_alerts: raw_alerts.len(), ..Default::default() };

        let normalized = normalize_batch(raw_alerts, now_ms);
        counters.processed_alerts = normalized.len();
        info!(raw = counters.raw_alerts, normalized = counters.processed_alerts, "normalization complete");

        let mut noise_filter = NoiseFilter::new();
        let filtered = noise_filter.apply(normalized, self.config.dedup_ttl_sec);
        info!(survivors = filtered.len(), "noise filtering complete");

        let episodes = episode_builder::build_episodes(filtered.clone(), self.config.episode_gap_sec);
        counters.episodes_created = episodes.len();
        info!(episodes = counters.episodes_created, "episode grouping complete");

        let mut situations = situation_assembler::assemble(episodes, &self.graph);
        counters.situations_created = situations.len();
        info!(situations = counters.situations_created, "situation assembly complete");

        situations = temporal_spreader::spread(situations, &filtered);

        let correlations: Vec<Vec<CorrelationRecord>> = situations
            .par_iter()
            .map(|s| correlation_engine::evaluate(s, self.config.min_support, self.config.max_lag_sec))
            .collect();

        situations.par_iter_mut().for_each(|s| {
            cause_selector::select(s, &self.graph, self.graph_provided, &noise_filter);
        });

        let all_correlations: Vec<CorrelationRecord> = correlations.into_iter().flatten().collect();
        counters.correlations_found = all_correlations.len();
        info!(
            situations = counters.situations_created,
            correlations = counters.correlations_found,
            "scoring and correlation complete"
        );

        let run_meta = RunMeta {
            input_dir: input_dir.to_string(),
            window_sec: self.config.window_sec,
            max_lag_sec: self.config.max_lag_sec,
            min_support: self.config.min_support,
            dedup_ttl_sec: self.config.dedup_ttl_sec,
            episode_gap_sec: self.config.episode_gap_sec,
            raw_alerts: counters.raw_alerts,
            processed_alerts: counters.processed_alerts,
            episodes_created: counters.episodes_created,
            situations_created: counters.situations_created,
            correlations_found: counters.correlations_found,
            generated_at,
        };

        let mut emitter = Emitter::new(out);
        emitter.emit_run(run_meta, &situations, &all_correlations)?;

        Ok(counters)
    }
}
