//! Per-channel occupancy accounting.
//!
//! Aggregates the in-flight batch into per-channel token counts, estimated
//! latency loads, and tile usage, and checks the tile budget invariant after
//! every scheduling pass.

use crate::cost::CostModel;
use crate::request::Request;
use chansim_algorithms::ChannelLoad;
use thiserror::Error;

/// A channel was committed past its tile budget.
#[derive(Error, Debug)]
#[error("channel {channel} is over its tile budget of {capacity}\n  tiles left: {tiles_left:?}\n  tokens: {tokens:?}")]
pub struct InvariantViolation {
    pub channel: u32,
    pub capacity: u64,
    pub tiles_left: Vec<i64>,
    pub tokens: Vec<u64>,
}

/// Snapshot of what the in-flight batch costs each channel.
#[derive(Debug, Clone)]
pub struct ChannelAccounting {
    capacity: u64,
    tokens: Vec<u64>,
    loads: Vec<u64>,
    tiles_used: Vec<u64>,
}

impl ChannelAccounting {
    /// Tally every assigned request against its channel.
    pub fn collect(requests: &[Request], cost: &CostModel, num_channels: u32) -> Self {
        let n = num_channels as usize;
        let mut tokens = vec![0u64; n];
        let mut loads = vec![0u64; n];
        let mut tiles_used = vec![0u64; n];
        for request in requests {
            debug_assert!(request.channel().is_some(), "unassigned request in batch");
            if let Some(ch) = request.channel() {
                let seq_len = request.seq_len(cost.max_seq_len());
                tokens[ch as usize] += seq_len as u64;
                loads[ch as usize] += cost.estimated_latency(seq_len);
                tiles_used[ch as usize] += cost.tiles_used(seq_len);
            }
        }
        ChannelAccounting {
            capacity: cost.tiles_per_channel(),
            tokens,
            loads,
            tiles_used,
        }
    }

    /// Resident tokens per channel.
    pub fn tokens(&self) -> &[u64] {
        &self.tokens
    }

    /// Estimated latency load per channel, in cycles.
    pub fn loads(&self) -> &[u64] {
        &self.loads
    }

    /// Tile budget remaining per channel. Negative means over-committed.
    pub fn tiles_left(&self) -> Vec<i64> {
        self.tiles_used
            .iter()
            .map(|&used| self.capacity as i64 - used as i64)
            .collect()
    }

    /// Difference between the most and least loaded channel, in cycles.
    pub fn spread(&self) -> u64 {
        let max = self.loads.iter().max().copied().unwrap_or(0);
        let min = self.loads.iter().min().copied().unwrap_or(0);
        max - min
    }

    /// Channel views for an assignment pass.
    pub fn channel_loads(&self) -> Vec<ChannelLoad> {
        self.loads
            .iter()
            .zip(self.tiles_left())
            .map(|(&est_latency, tiles_free)| ChannelLoad {
                est_latency,
                tiles_free,
            })
            .collect()
    }

    /// Fail if any channel is over its tile budget.
    pub fn check(&self) -> Result<(), InvariantViolation> {
        let tiles_left = self.tiles_left();
        if let Some(ch) = tiles_left.iter().position(|&t| t < 0) {
            return Err(InvariantViolation {
                channel: ch as u32,
                capacity: self.capacity,
                tiles_left,
                tokens: self.tokens.clone(),
            });
        }
        Ok(())
    }
}
