//! TOML configuration parsing for chansim.
//!
//! Defines the complete configuration schema for simulation runs: run
//! parameters, model preset and sharding, memory channel geometry, and the
//! dataset source. Defaults reproduce the reference hardware profile (32
//! one-GiB channels) and the 7B model sharded four ways.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Validation(String),
    #[error("Unknown algorithm: {0} (available: rr, rrn, clb)")]
    UnknownAlgorithm(String),
    #[error("Unsupported model size: {0}B (supported: 7, 13, 30, 175)")]
    UnsupportedModelSize(u32),
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub simulation: SimulationSection,
    pub model: ModelSection,
    pub memory: MemorySection,
    pub dataset: DatasetSection,
}

/// General simulation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSection {
    /// Human-readable name for this simulation.
    #[serde(default = "default_sim_name")]
    pub name: String,
    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Assignment algorithm: "rr", "rrn", or "clb".
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Number of requests kept in flight at all times.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
    /// Cycles advanced per simulation step.
    #[serde(default = "default_cycle_unit")]
    pub cycle_unit: u64,
    /// Steps between snapshot events.
    #[serde(default = "default_export_interval")]
    pub export_interval: u64,
    /// Steps to run before snapshots start being written.
    #[serde(default = "default_warmup_steps")]
    pub warmup_steps: u64,
    /// Number of snapshots to write before the run ends.
    #[serde(default = "default_num_exports")]
    pub num_exports: u32,
}

fn default_sim_name() -> String {
    "simulation".to_string()
}
fn default_seed() -> u64 {
    42
}
fn default_algorithm() -> String {
    "rr".to_string()
}
fn default_batch_size() -> u32 {
    256
}
fn default_cycle_unit() -> u64 {
    10
}
fn default_export_interval() -> u64 {
    50
}
fn default_warmup_steps() -> u64 {
    10_000
}
fn default_num_exports() -> u32 {
    10
}

/// Model preset and sharding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSection {
    /// Parameter count in billions; selects the architecture preset.
    #[serde(default = "default_model_size")]
    pub size: u32,
    /// Tensor parallel degree.
    #[serde(default = "default_tensor_parallel")]
    pub tensor_parallel: u32,
    /// Pipeline parallel degree.
    #[serde(default = "default_pipeline_parallel")]
    pub pipeline_parallel: u32,
    /// Context window: sequence lengths are capped here.
    #[serde(default = "default_max_seq_len")]
    pub max_seq_len: u32,
}

fn default_model_size() -> u32 {
    7
}
fn default_tensor_parallel() -> u32 {
    4
}
fn default_pipeline_parallel() -> u32 {
    1
}
fn default_max_seq_len() -> u32 {
    2048
}

/// Architecture constants for a supported model size.
#[derive(Debug, Clone, Copy)]
pub struct ModelPreset {
    /// Parameter count in billions.
    pub params_b: u64,
    /// Embedding width.
    pub embedding_dim: u64,
    /// Attention head count.
    pub num_heads: u64,
    /// Transformer layer count.
    pub num_layers: u64,
}

impl ModelSection {
    /// Resolve the architecture preset for the configured size.
    pub fn preset(&self) -> Result<ModelPreset, ConfigError> {
        let (embedding_dim, num_heads, num_layers) = match self.size {
            7 => (4096, 32, 32),
            13 => (5120, 40, 40),
            30 => (7168, 56, 48),
            175 => (12288, 96, 96),
            other => return Err(ConfigError::UnsupportedModelSize(other)),
        };
        Ok(ModelPreset {
            params_b: self.size as u64,
            embedding_dim,
            num_heads,
            num_layers,
        })
    }
}

/// Memory channel geometry and PIM operation latencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySection {
    /// Number of memory channels, one GiB each.
    #[serde(default = "default_num_channels")]
    pub num_channels: u32,
    /// DRAM page size in bytes.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// DRAM banks per channel.
    #[serde(default = "default_banks_per_channel")]
    pub banks_per_channel: u32,
    /// Cycles for one gwrite operation.
    #[serde(default = "default_gwrite_latency")]
    pub gwrite_latency: u64,
    /// Cycles for one gemv operation.
    #[serde(default = "default_gemv_latency")]
    pub gemv_latency: u64,
}

fn default_num_channels() -> u32 {
    32
}
fn default_page_size() -> u32 {
    512
}
fn default_banks_per_channel() -> u32 {
    32
}
fn default_gwrite_latency() -> u64 {
    100
}
fn default_gemv_latency() -> u64 {
    184
}

impl MemorySection {
    /// One PIM tile in bytes (a page across every bank, two bytes per cell).
    pub fn tile_size(&self) -> u64 {
        self.page_size as u64 * self.banks_per_channel as u64 * 2
    }
}

/// Dataset source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSection {
    /// Dataset name, embedded in snapshot filenames.
    #[serde(default = "default_dataset_name")]
    pub name: String,
    /// Path to the token-count TSV.
    pub path: Option<String>,
}

fn default_dataset_name() -> String {
    "dataset".to_string()
}

impl SimConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.batch_size == 0 {
            return Err(ConfigError::Validation(
                "batch_size must be > 0".to_string(),
            ));
        }
        if self.simulation.cycle_unit == 0 {
            return Err(ConfigError::Validation(
                "cycle_unit must be > 0".to_string(),
            ));
        }
        if self.simulation.export_interval == 0 {
            return Err(ConfigError::Validation(
                "export_interval must be > 0".to_string(),
            ));
        }
        if chansim_algorithms::algorithm_by_name(&self.simulation.algorithm).is_none() {
            return Err(ConfigError::UnknownAlgorithm(
                self.simulation.algorithm.clone(),
            ));
        }
        if self.memory.num_channels == 0 {
            return Err(ConfigError::Validation(
                "num_channels must be > 0".to_string(),
            ));
        }
        if self.memory.page_size == 0 {
            return Err(ConfigError::Validation("page_size must be > 0".to_string()));
        }
        if self.memory.banks_per_channel == 0 {
            return Err(ConfigError::Validation(
                "banks_per_channel must be > 0".to_string(),
            ));
        }
        if self.model.tensor_parallel == 0 {
            return Err(ConfigError::Validation(
                "tensor_parallel must be > 0".to_string(),
            ));
        }
        if self.model.pipeline_parallel == 0 {
            return Err(ConfigError::Validation(
                "pipeline_parallel must be > 0".to_string(),
            ));
        }
        if self.model.max_seq_len == 0 {
            return Err(ConfigError::Validation(
                "max_seq_len must be > 0".to_string(),
            ));
        }

        let preset = self.model.preset()?;
        if preset.embedding_dim % preset.num_heads != 0 {
            return Err(ConfigError::Validation(format!(
                "embedding dim {} must divide evenly by head count {}",
                preset.embedding_dim, preset.num_heads,
            )));
        }
        if preset.embedding_dim % self.model.tensor_parallel as u64 != 0 {
            return Err(ConfigError::Validation(format!(
                "embedding dim {} must divide evenly by tensor_parallel {}",
                preset.embedding_dim, self.model.tensor_parallel,
            )));
        }

        // Proves the model weights fit and the tile budget is computable.
        crate::cost::CostModel::new(&self.model, &self.memory).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
[simulation]
name = "test-sim"
seed = 123
algorithm = "clb"
batch_size = 64
cycle_unit = 10
export_interval = 25
warmup_steps = 100
num_exports = 4

[model]
size = 7
tensor_parallel = 4
pipeline_parallel = 1
max_seq_len = 2048

[memory]
num_channels = 32
page_size = 512
banks_per_channel = 32
gwrite_latency = 100
gemv_latency = 184

[dataset]
name = "alpaca"
path = "datasets/alpaca/stats.tsv"
"#;

    #[test]
    fn test_parse_config() {
        let config = SimConfig::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.simulation.name, "test-sim");
        assert_eq!(config.simulation.seed, 123);
        assert_eq!(config.simulation.algorithm, "clb");
        assert_eq!(config.simulation.batch_size, 64);
        assert_eq!(config.model.size, 7);
        assert_eq!(config.memory.num_channels, 32);
        assert_eq!(config.dataset.name, "alpaca");
    }

    #[test]
    fn test_defaults() {
        let toml = r#"
[simulation]

[model]

[memory]

[dataset]
"#;
        let config = SimConfig::from_str(toml).unwrap();
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.simulation.algorithm, "rr");
        assert_eq!(config.simulation.batch_size, 256);
        assert_eq!(config.simulation.cycle_unit, 10);
        assert_eq!(config.simulation.export_interval, 50);
        assert_eq!(config.simulation.warmup_steps, 10_000);
        assert_eq!(config.simulation.num_exports, 10);
        assert_eq!(config.model.size, 7);
        assert_eq!(config.model.tensor_parallel, 4);
        assert_eq!(config.model.max_seq_len, 2048);
        assert_eq!(config.memory.num_channels, 32);
        assert_eq!(config.memory.page_size, 512);
        assert_eq!(config.dataset.name, "dataset");
        assert!(config.dataset.path.is_none());
    }

    #[test]
    fn test_tile_size() {
        let config = SimConfig::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.memory.tile_size(), 512 * 32 * 2);
    }

    #[test]
    fn test_preset_lookup() {
        let config = SimConfig::from_str(SAMPLE_CONFIG).unwrap();
        let preset = config.model.preset().unwrap();
        assert_eq!(preset.embedding_dim, 4096);
        assert_eq!(preset.num_heads, 32);
        assert_eq!(preset.num_layers, 32);
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let toml = r#"
[simulation]
algorithm = "xyz"

[model]

[memory]

[dataset]
"#;
        match SimConfig::from_str(toml) {
            Err(ConfigError::UnknownAlgorithm(name)) => assert_eq!(name, "xyz"),
            other => panic!("Expected UnknownAlgorithm, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_model_size_rejected() {
        let toml = r#"
[simulation]

[model]
size = 9

[memory]

[dataset]
"#;
        match SimConfig::from_str(toml) {
            Err(ConfigError::UnsupportedModelSize(size)) => assert_eq!(size, 9),
            other => panic!("Expected UnsupportedModelSize, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_zero_batch_size() {
        let toml = r#"
[simulation]
batch_size = 0

[model]

[memory]

[dataset]
"#;
        assert!(SimConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_validation_zero_channels() {
        let toml = r#"
[simulation]

[model]

[memory]
num_channels = 0

[dataset]
"#;
        assert!(SimConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_validation_zero_export_interval() {
        let toml = r#"
[simulation]
export_interval = 0

[model]

[memory]

[dataset]
"#;
        assert!(SimConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_validation_indivisible_tensor_parallel() {
        let toml = r#"
[simulation]

[model]
tensor_parallel = 3

[memory]

[dataset]
"#;
        assert!(SimConfig::from_str(toml).is_err());
    }

    #[test]
    fn test_validation_weights_do_not_fit() {
        // 30B unsharded needs 60 GiB of weights; 32 channels hold 32 GiB.
        let toml = r#"
[simulation]

[model]
size = 30
tensor_parallel = 1

[memory]

[dataset]
"#;
        match SimConfig::from_str(toml) {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("weights")),
            other => panic!("Expected Validation, got {:?}", other),
        }
    }
}
