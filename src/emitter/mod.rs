//! Stage 8: serializes the run record stream.

use crate::types::{CorrelationRecord, Situation};
use serde::Serialize;
use std::io::Write;

/// Run-level summary, always the first record emitted.
#[derive(Debug, Clone, Serialize)]
pub struct RunMeta {
    pub input_dir: String,
    pub window_sec: u64,
    pub max_lag_sec: i64,
    pub min_support: usize,
    pub dedup_ttl_sec: i64,
    pub episode_gap_sec: i64,
    pub raw_alerts: usize,
    pub processed_alerts: usize,
    pub episodes_created: usize,
    pub situations_created: usize,
    pub correlations_found: usize,
    pub generated_at: String,
}

/// The slim per-episode view and primary-cause/related-alert fields
/// attached directly so the output record carries exactly the public shape,
/// without dragging internal staging fields along.
#[derive(Debug, Clone, Serialize)]
pub struct SituationRecord {
    pub situation_id: String,
    pub window: crate::types::Window,
    pub episodes: Vec<crate::types::EpisodeSummary>,
    pub primary_cause: Option<crate::types::PrimaryCause>,
    pub blast_radius: crate::types::BlastRadius,
    pub change_refs: Vec<crate::types::ChangeRef>,
    pub resource_refs: Vec<crate::types::ResourceRef>,
    pub related_alerts: Vec<crate::types::RelatedAlert>,
    pub score: f64,
    pub next_actions: Vec<String>,
    pub insufficient_temporal_spread: bool,
    pub reason: Option<String>,
    pub pad_ms_used: Option<i64>,
    pub bin_size_s: Option<i64>,
}

impl From<&Situation> for SituationRecord {
    fn from(s: &Situation) -> Self {
        Self {
            situation_id: s.situation_id.clone(),
            window: s.window,
            episodes: s.episodes.iter().map(|e| e.summary()).collect(),
            primary_cause: s.primary_cause.clone(),
            blast_radius: s.blast_radius,
            change_refs: s.change_refs.clone(),
            resource_refs: s.resource_refs.clone(),
            related_alerts: s.related_alerts.clone(),
            score: s.score,
            next_actions: s.next_actions.clone(),
            insufficient_temporal_spread: s.insufficient_temporal_spread,
            reason: s.reason.clone(),
            pad_ms_used: s.pad_ms_used,
            bin_size_s: s.bin_size_s,
        }
    }
}

/// One self-describing record in the output stream, tagged by `type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Record {
    RunMeta(RunMeta),
    Situation(SituationRecord),
    Correlation(CorrelationRecord),
}

/// Writes one JSON record per line to any `impl Write`.
pub struct Emitter<W: Write> {
    writer: W,
}

impl<W: Write> Emitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn emit(&mut self, record: &Record) -> std::io::Result<()> {
        let line = serde_json::to_string(record).expect("record types are always serializable");
        writeln!(self.writer, "{line}")
    }

    /// `run_meta` first, then situations in their already-deterministic
    /// order, then correlations in the order produced.
    pub fn emit_run(
        &mut self,
        run_meta: RunMeta,
        situations: &[Situation],
        correlations: &[CorrelationRecord],
    ) -> std::io::Result<()> {
        self.emit(&Record::RunMeta(run_meta))?;
        for situation in situations {
            self.emit(&Record::Situation(SituationRecord::from(situation)))?;
        }
        for correlation in correlations {
            self.emit(&Record::Correlation(correlation.clone()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_run_emits_only_run_meta() {
        let mut buf = Vec::new();
        let mut emitter = Emitter::new(&mut buf);
        let run_meta = RunMeta {
            input_dir: "in".to_string(),
            window_sec: 900,
            max_lag_sec: 90,
            min_support: 3,
            dedup_ttl_sec: 120,
            episode_gap_sec: 300,
            raw_alerts: 0,
            processed_alerts: 0,
            episodes_created: 0,
            situations_created: 0,
            correlations_found: 0,
            generated_at: "1970-01-01T00:00:00+00:00".to_string(),
        };
        emitter.emit_run(run_meta, &[], &[]).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["type"], "run_meta");
        assert_eq!(value["situations_created"], 0);
    }
}
