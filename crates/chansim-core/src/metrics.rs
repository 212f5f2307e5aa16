//! Run metrics: load balance quality over a simulation run.
//!
//! The collector samples channel state every step and aggregates at the end
//! into [`RunMetrics`], which serializes to JSON for downstream analysis and
//! formats as a console table.

use crate::accounting::ChannelAccounting;
use crate::request::Request;
use serde::{Deserialize, Serialize};

/// Distribution summary of a sampled series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Percentiles {
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Percentiles {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Percentiles {
                p50: 0.0,
                p90: 0.0,
                p99: 0.0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
            };
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;
        Percentiles {
            p50: percentile_sorted(&sorted, 50.0),
            p90: percentile_sorted(&sorted, 90.0),
            p99: percentile_sorted(&sorted, 99.0),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            mean,
        }
    }
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

/// Standard deviation over mean. Zero when the mean is zero.
pub fn coefficient_of_variation(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<u64>() as f64 / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt() / mean
}

/// Jain's fairness index: 1.0 is perfectly even, 1/n is one loaded channel.
pub fn jains_fairness_index(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    let sum = values.iter().sum::<u64>() as f64;
    let sum_sq = values.iter().map(|&v| (v as f64) * (v as f64)).sum::<f64>();
    if sum_sq == 0.0 {
        return 1.0;
    }
    (sum * sum) / (values.len() as f64 * sum_sq)
}

/// Accumulates per-step samples over a run.
pub struct MetricsCollector {
    spread_samples: Vec<f64>,
    seq_len_samples: Vec<f64>,
    min_tiles_left: Option<i64>,
    snapshots: u32,
}

impl MetricsCollector {
    pub fn new() -> Self {
        MetricsCollector {
            spread_samples: Vec::new(),
            seq_len_samples: Vec::new(),
            min_tiles_left: None,
            snapshots: 0,
        }
    }

    /// Sample channel state after one step.
    pub fn sample_step(&mut self, accounting: &ChannelAccounting) {
        self.spread_samples.push(accounting.spread() as f64);
        if let Some(min) = accounting.tiles_left().into_iter().min() {
            self.min_tiles_left = Some(match self.min_tiles_left {
                Some(current) => current.min(min),
                None => min,
            });
        }
    }

    /// Sample the mean sequence length of the batch.
    pub fn sample_seq_lens(&mut self, requests: &[Request], max_seq_len: u32) {
        if requests.is_empty() {
            return;
        }
        let total: u64 = requests
            .iter()
            .map(|r| r.seq_len(max_seq_len) as u64)
            .sum();
        self.seq_len_samples.push(total as f64 / requests.len() as f64);
    }

    /// Count one written snapshot.
    pub fn record_snapshot(&mut self) {
        self.snapshots += 1;
    }

    pub fn snapshots(&self) -> u32 {
        self.snapshots
    }

    /// Fold the samples into final run metrics.
    pub fn aggregate(
        self,
        algorithm: &str,
        dataset: &str,
        batch_size: u32,
        steps: u64,
        cycles: u64,
        final_accounting: &ChannelAccounting,
    ) -> RunMetrics {
        let final_loads = final_accounting.loads().to_vec();
        let mean_seq_len = if self.seq_len_samples.is_empty() {
            0.0
        } else {
            self.seq_len_samples.iter().sum::<f64>() / self.seq_len_samples.len() as f64
        };
        let min_tiles_left = self.min_tiles_left.unwrap_or_else(|| {
            final_accounting.tiles_left().into_iter().min().unwrap_or(0)
        });
        RunMetrics {
            algorithm: algorithm.to_string(),
            dataset: dataset.to_string(),
            batch_size,
            steps,
            cycles,
            snapshots: self.snapshots,
            load_spread: Percentiles::from_values(&self.spread_samples),
            mean_seq_len,
            load_cv: coefficient_of_variation(&final_loads),
            jains_fairness_index: jains_fairness_index(&final_loads),
            min_tiles_left,
            final_tokens: final_accounting.tokens().to_vec(),
            final_loads,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Final metrics for one simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMetrics {
    pub algorithm: String,
    pub dataset: String,
    pub batch_size: u32,
    pub steps: u64,
    pub cycles: u64,
    pub snapshots: u32,
    pub load_spread: Percentiles,
    pub mean_seq_len: f64,
    pub load_cv: f64,
    pub jains_fairness_index: f64,
    pub min_tiles_left: i64,
    pub final_loads: Vec<u64>,
    pub final_tokens: Vec<u64>,
}

/// Render one run as a console table.
pub fn format_table(metrics: &RunMetrics) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:=<70}\n", ""));
    out.push_str(&format!(
        "Simulation results: {} on {}\n",
        metrics.algorithm, metrics.dataset,
    ));
    out.push_str(&format!("{:-<70}\n", ""));
    out.push_str(&format!("{:<32} {:>14}\n", "batch size", metrics.batch_size));
    out.push_str(&format!("{:<32} {:>14}\n", "steps", metrics.steps));
    out.push_str(&format!("{:<32} {:>14}\n", "cycles", metrics.cycles));
    out.push_str(&format!("{:<32} {:>14}\n", "snapshots", metrics.snapshots));
    out.push_str(&format!(
        "{:<32} {:>14.1}\n",
        "mean seq len", metrics.mean_seq_len,
    ));
    out.push_str(&format!(
        "{:<32} {:>14.0}\n",
        "load spread p50 (cycles)", metrics.load_spread.p50,
    ));
    out.push_str(&format!(
        "{:<32} {:>14.0}\n",
        "load spread p99 (cycles)", metrics.load_spread.p99,
    ));
    out.push_str(&format!(
        "{:<32} {:>14.4}\n",
        "final load CV", metrics.load_cv,
    ));
    out.push_str(&format!(
        "{:<32} {:>14.4}\n",
        "Jain's fairness index", metrics.jains_fairness_index,
    ));
    out.push_str(&format!(
        "{:<32} {:>14}\n",
        "min tiles left", metrics.min_tiles_left,
    ));
    out.push_str(&format!("{:=<70}\n", ""));
    out
}

/// Render several runs side by side.
pub fn format_comparison_table(results: &[RunMetrics]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:=<78}\n", ""));
    out.push_str(&format!(
        "{:<10} {:>8} {:>12} {:>12} {:>10} {:>10} {:>10}\n",
        "algorithm", "batch", "spread p50", "spread p99", "CV", "fairness", "min tiles",
    ));
    out.push_str(&format!("{:-<78}\n", ""));
    for m in results {
        out.push_str(&format!(
            "{:<10} {:>8} {:>12.0} {:>12.0} {:>10.4} {:>10.4} {:>10}\n",
            m.algorithm,
            m.batch_size,
            m.load_spread.p50,
            m.load_spread.p99,
            m.load_cv,
            m.jains_fairness_index,
            m.min_tiles_left,
        ));
    }
    out.push_str(&format!("{:=<78}\n", ""));
    out
}
