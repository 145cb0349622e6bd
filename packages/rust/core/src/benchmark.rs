//! Summarization benchmark across text-generation models.
//!
//! Each model summarizes the same source texts with the same instruction;
//! per-call latency and output length are recorded and reduced to summary
//! statistics.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, instrument, warn};

use partnerscout_llm::TextGenerator;
use partnerscout_shared::PartnershipRecord;

use crate::pipeline::ProgressReporter;
use crate::prompts;

/// One model's outputs, aligned with the benchmarked records.
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub model: String,
    /// `None` where the record had no source text or the call failed.
    pub summaries: Vec<Option<String>>,
    /// Latency of each successful call.
    pub latencies: Vec<Duration>,
    /// Wall-clock time for the whole model pass.
    pub total: Duration,
}

/// Aggregate statistics for one model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStats {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Calls")]
    pub calls: usize,
    #[serde(rename = "Total Time (s)")]
    pub total_secs: f64,
    #[serde(rename = "Avg Time (s)")]
    pub mean_secs: f64,
    #[serde(rename = "Min Time (s)")]
    pub min_secs: f64,
    #[serde(rename = "Max Time (s)")]
    pub max_secs: f64,
    #[serde(rename = "Median Time (s)")]
    pub median_secs: f64,
    #[serde(rename = "Avg Length")]
    pub mean_len: f64,
    #[serde(rename = "Min Length")]
    pub min_len: usize,
    #[serde(rename = "Max Length")]
    pub max_len: usize,
    #[serde(rename = "Median Length")]
    pub median_len: f64,
}

impl ModelRun {
    pub fn stats(&self) -> ModelStats {
        let secs: Vec<f64> = self.latencies.iter().map(Duration::as_secs_f64).collect();
        let lengths: Vec<usize> = self
            .summaries
            .iter()
            .flatten()
            .map(|s| s.chars().count())
            .collect();
        let lengths_f: Vec<f64> = lengths.iter().map(|&l| l as f64).collect();

        ModelStats {
            model: self.model.clone(),
            calls: self.latencies.len(),
            total_secs: self.total.as_secs_f64(),
            mean_secs: mean(&secs),
            min_secs: secs.iter().copied().reduce(f64::min).unwrap_or(0.0),
            max_secs: secs.iter().copied().reduce(f64::max).unwrap_or(0.0),
            median_secs: median(&secs),
            mean_len: mean(&lengths_f),
            min_len: lengths.iter().copied().min().unwrap_or(0),
            max_len: lengths.iter().copied().max().unwrap_or(0),
            median_len: median(&lengths_f),
        }
    }
}

/// Outputs of every benchmarked model.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkReport {
    pub runs: Vec<ModelRun>,
}

impl BenchmarkReport {
    pub fn stats(&self) -> Vec<ModelStats> {
        self.runs.iter().map(ModelRun::stats).collect()
    }

    /// Side-by-side table: partners, source text, then one `<model>_summary`
    /// column per model.
    pub fn comparison_table(
        &self,
        records: &[PartnershipRecord],
    ) -> (Vec<String>, Vec<Vec<String>>) {
        let mut headers = vec![
            "partner1".to_string(),
            "partner2".to_string(),
            "raw_content".to_string(),
        ];
        headers.extend(self.runs.iter().map(|r| format!("{}_summary", r.model)));

        let rows = records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let mut row = vec![
                    record.partner1.clone(),
                    record.partner2.clone(),
                    record.raw_content.clone().unwrap_or_default(),
                ];
                row.extend(
                    self.runs
                        .iter()
                        .map(|run| run.summaries.get(i).cloned().flatten().unwrap_or_default()),
                );
                row
            })
            .collect();

        (headers, rows)
    }
}

/// Summarize every record's source text with each generator in turn.
#[instrument(skip_all, fields(models = generators.len(), records = records.len()))]
pub async fn run_benchmark(
    generators: &[Box<dyn TextGenerator>],
    instruction: &str,
    records: &[PartnershipRecord],
    max_content_chars: usize,
    progress: &dyn ProgressReporter,
) -> BenchmarkReport {
    let mut report = BenchmarkReport::default();

    for generator in generators {
        let model = generator.model().to_string();
        progress.phase(&format!("Benchmarking {model}"));
        let started = Instant::now();
        let mut summaries = Vec::with_capacity(records.len());
        let mut latencies = Vec::new();

        for (i, record) in records.iter().enumerate() {
            progress.record_started(&model, i + 1, records.len());
            let Some(content) = record.raw_content.as_deref().filter(|c| !c.trim().is_empty())
            else {
                summaries.push(None);
                continue;
            };

            let call_started = Instant::now();
            let prompt = prompts::benchmark(instruction, prompts::clip(content, max_content_chars));
            match generator.generate(&prompt).await {
                Ok(summary) => {
                    latencies.push(call_started.elapsed());
                    summaries.push(Some(summary));
                }
                Err(e) => {
                    warn!(%model, index = i, error = %e, "benchmark call failed");
                    summaries.push(None);
                }
            }
        }

        let run = ModelRun {
            model,
            summaries,
            latencies,
            total: started.elapsed(),
        };
        info!(model = %run.model, calls = run.latencies.len(), "model pass complete");
        report.runs.push(run);
    }

    progress.done(&format!("Benchmarked {} models", report.runs.len()));
    report
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
