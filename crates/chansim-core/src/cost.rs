//! Cost model for requests resident in PIM memory channels.
//!
//! Every scheduling decision is priced through two quantities derived from a
//! request's current sequence length: the KV-cache footprint in tiles and the
//! estimated attention latency in cycles. Both are exact integer computations
//! over the model preset and channel geometry.

use crate::config::{ConfigError, MemorySection, ModelSection};

const GIB: u64 = 1 << 30;

/// Precomputed per-run constants for pricing requests.
#[derive(Debug, Clone)]
pub struct CostModel {
    embedding_dim: u64,
    num_heads: u64,
    num_layers: u64,
    head_dim: u64,
    tensor_parallel: u64,
    pipeline_parallel: u64,
    page_size: u64,
    banks_per_channel: u64,
    gwrite_latency: u64,
    gemv_latency: u64,
    tiles_per_channel: u64,
    max_seq_len: u32,
}

impl CostModel {
    /// Build the cost model and the per-channel tile budget.
    ///
    /// Fails when the sharded model weights do not leave room for any
    /// KV-cache in the configured channels.
    pub fn new(model: &ModelSection, memory: &MemorySection) -> Result<Self, ConfigError> {
        let preset = model.preset()?;
        let tensor_parallel = model.tensor_parallel as u64;
        let pipeline_parallel = model.pipeline_parallel as u64;

        let weight_bytes = ((preset.params_b as f64 / pipeline_parallel as f64) * 2.0
            * GIB as f64) as u64
            / tensor_parallel;
        let total_bytes = memory.num_channels as u64 * GIB;
        if weight_bytes >= total_bytes {
            return Err(ConfigError::Validation(format!(
                "model weights ({} bytes per device) do not fit in {} channels",
                weight_bytes, memory.num_channels,
            )));
        }
        let tiles_per_channel =
            (total_bytes - weight_bytes).div_ceil(memory.tile_size()) / memory.num_channels as u64;

        Ok(CostModel {
            embedding_dim: preset.embedding_dim,
            num_heads: preset.num_heads,
            num_layers: preset.num_layers,
            head_dim: preset.embedding_dim / preset.num_heads,
            tensor_parallel,
            pipeline_parallel,
            page_size: memory.page_size as u64,
            banks_per_channel: memory.banks_per_channel as u64,
            gwrite_latency: memory.gwrite_latency,
            gemv_latency: memory.gemv_latency,
            tiles_per_channel,
            max_seq_len: model.max_seq_len,
        })
    }

    /// Tiles a request's KV-cache occupies at the given sequence length.
    pub fn tiles_used(&self, seq_len: u32) -> u64 {
        let s = seq_len as u64;
        let effective_dim = self.embedding_dim / self.tensor_parallel;
        let key_pages = s.div_ceil(self.banks_per_channel);
        let value_pages = s.div_ceil(self.page_size);
        let key_tiles = key_pages * effective_dim.div_ceil(self.page_size);
        let value_tiles = value_pages * effective_dim.div_ceil(self.banks_per_channel);
        (key_tiles + value_tiles) * self.num_layers / self.pipeline_parallel
    }

    /// Estimated attention latency in cycles at the given sequence length.
    pub fn estimated_latency(&self, seq_len: u32) -> u64 {
        let s = seq_len as u64;
        let effective_dim = self.embedding_dim / self.tensor_parallel;

        // key * query
        let chunks = effective_dim.div_ceil(self.page_size);
        let tiles = s.div_ceil(self.banks_per_channel);
        let score_cycles = chunks * self.gwrite_latency + chunks * tiles * self.gemv_latency;

        // logit * value
        let chunks = s.div_ceil(self.page_size) * self.num_heads;
        let tiles = self.head_dim.div_ceil(self.banks_per_channel);
        let context_cycles = chunks * self.gwrite_latency + chunks * tiles * self.gemv_latency;

        score_cycles + context_cycles
    }

    /// Tile budget left per channel after model weights are placed.
    pub fn tiles_per_channel(&self) -> u64 {
        self.tiles_per_channel
    }

    /// Context window the simulation caps sequence lengths at.
    pub fn max_seq_len(&self) -> u32 {
        self.max_seq_len
    }
}
