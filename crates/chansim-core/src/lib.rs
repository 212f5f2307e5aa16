//! chansim-core: cycle-level simulation of PIM memory channels serving
//! batched LLM inference.
//!
//! A fixed-size batch of decode requests is kept full at all times: finished
//! requests leave, replacements are drawn from a dataset-derived candidate
//! pool, and an assignment algorithm places each newcomer's KV-cache on a
//! memory channel. The simulation tracks per-channel occupancy and estimated
//! attention latency so algorithms can be compared on load balance.
//!
//! ```text
//!   dataset TSV ──> candidate pool ──> Scheduler ──> Snapshots (CSV)
//!                                        │   ▲
//!                                 queued │   │ ChannelLoad views
//!                                        ▼   │
//!                               AssignmentAlgorithm (rr / rrn / clb)
//!                                        │
//!                                        ▼
//!                               ChannelAccounting ──> RunMetrics (JSON)
//! ```
//!
//! [`run_simulation`] drives a full run: warmup, periodic snapshot export,
//! and metrics aggregation. [`Simulation`] is the step-at-a-time engine
//! underneath it.

pub mod accounting;
pub mod clock;
pub mod config;
pub mod cost;
pub mod dataset;
pub mod engine;
pub mod metrics;
pub mod request;
pub mod scheduler;
pub mod trace;

pub use accounting::{ChannelAccounting, InvariantViolation};
pub use clock::SimClock;
pub use config::{ConfigError, SimConfig};
pub use cost::CostModel;
pub use dataset::{load_dataset, parse_dataset, DatasetError, DatasetStats};
pub use engine::{SimError, Simulation};
pub use metrics::{
    format_comparison_table, format_table, MetricsCollector, Percentiles, RunMetrics,
};
pub use request::Request;
pub use scheduler::Scheduler;
pub use trace::{
    read_snapshot, snapshot_filename, write_snapshot, Snapshot, SnapshotRow, TraceError,
    SNAPSHOT_HEADER,
};

use std::path::Path;

/// Run a simulation to completion: advance until the configured number of
/// snapshots has been taken, exporting each one when a directory is given.
pub fn run_simulation(
    config: SimConfig,
    candidates: Vec<Request>,
    export_dir: Option<&Path>,
) -> Result<RunMetrics, SimError> {
    let algorithm = config.simulation.algorithm.clone();
    let dataset = config.dataset.name.clone();
    let batch_size = config.simulation.batch_size;
    let cycle_unit = config.simulation.cycle_unit;
    let export_interval = config.simulation.export_interval;
    let warmup_steps = config.simulation.warmup_steps;
    let num_exports = config.simulation.num_exports;
    let model_size = config.model.size;
    let tensor_parallel = config.model.tensor_parallel;
    let pipeline_parallel = config.model.pipeline_parallel;

    let mut sim = Simulation::new(config, candidates)?;
    let max_seq_len = sim.cost().max_seq_len();
    let mut collector = MetricsCollector::new();
    let mut step: u64 = 0;

    while collector.snapshots() < num_exports {
        step += 1;
        sim.advance(cycle_unit)?;
        collector.sample_step(&sim.accounting());
        if step % export_interval == 0 {
            collector.sample_seq_lens(sim.ongoing(), max_seq_len);
            if step > warmup_steps {
                if let Some(dir) = export_dir {
                    let filename = snapshot_filename(
                        &dataset,
                        batch_size,
                        model_size,
                        tensor_parallel,
                        pipeline_parallel,
                        &algorithm,
                        collector.snapshots(),
                    );
                    write_snapshot(&dir.join(filename), &sim.snapshot())?;
                }
                collector.record_snapshot();
            }
        }
    }

    let final_accounting = sim.accounting();
    Ok(collector.aggregate(
        &algorithm,
        &dataset,
        batch_size,
        step,
        sim.cycle(),
        &final_accounting,
    ))
}

/// Run the same configuration once per algorithm, without snapshot export.
///
/// Every run draws the same request stream: the seed is shared and request
/// completion depends only on token counts, so the comparison isolates the
/// placement decisions.
pub fn compare_algorithms(
    config: &SimConfig,
    candidates: &[Request],
    algorithm_names: &[&str],
) -> Result<Vec<RunMetrics>, SimError> {
    let mut results = Vec::with_capacity(algorithm_names.len());
    for &name in algorithm_names {
        let mut run_config = config.clone();
        run_config.simulation.algorithm = name.to_string();
        results.push(run_simulation(run_config, candidates.to_vec(), None)?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smoke_config() -> SimConfig {
        SimConfig::from_str(
            r#"
[simulation]
seed = 5
algorithm = "rr"
batch_size = 8
cycle_unit = 5
export_interval = 2
warmup_steps = 0
num_exports = 3

[model]

[memory]

[dataset]
name = "smoke"
"#,
        )
        .unwrap()
    }

    fn smoke_candidates() -> Vec<Request> {
        vec![Request::new(20, 6), Request::new(60, 12)]
    }

    #[test]
    fn test_run_simulation_terminates_after_exports() {
        let metrics = run_simulation(smoke_config(), smoke_candidates(), None).unwrap();
        assert_eq!(metrics.snapshots, 3);
        assert_eq!(metrics.steps, 6);
        assert_eq!(metrics.cycles, 30);
        assert_eq!(metrics.algorithm, "rr");
        assert_eq!(metrics.dataset, "smoke");
        assert_eq!(metrics.final_loads.len(), 32);
    }

    #[test]
    fn test_compare_preserves_order() {
        let config = smoke_config();
        let candidates = smoke_candidates();
        let results = compare_algorithms(&config, &candidates, &["clb", "rr", "rrn"]).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].algorithm, "clb");
        assert_eq!(results[1].algorithm, "rr");
        assert_eq!(results[2].algorithm, "rrn");
    }

    #[test]
    fn test_run_metrics_serialize_to_json() {
        let metrics = run_simulation(smoke_config(), smoke_candidates(), None).unwrap();
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains("\"algorithm\":\"rr\""));
        assert!(json.contains("\"jains_fairness_index\""));
        let back: RunMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.snapshots, metrics.snapshots);
    }
}
