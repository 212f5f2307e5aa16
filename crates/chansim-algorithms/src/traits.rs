//! Assignment algorithm trait definitions.
//!
//! All assignment algorithms implement the [`AssignmentAlgorithm`] trait,
//! which receives the cost figures of the queued requests and a mutable view
//! of the current channel standings, and returns one channel per request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cost figures for one queued request, provided to assignment algorithms.
///
/// This is the algorithms crate's view of a request: only the numbers an
/// assignment decision can depend on, not the full request state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RequestCost {
    /// Effective sequence length (prompt plus generated, capped).
    pub seq_len: u32,
    /// Memory tiles the request occupies on whichever channel it lands on.
    pub tiles: u64,
    /// Estimated per-iteration service latency in device cycles.
    pub est_latency: u64,
}

/// A channel's standing at assignment time.
///
/// Implementations update these views as they place requests, so decisions
/// later in the same pass see the placements made earlier in the pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChannelLoad {
    /// Sum of estimated latencies of the requests resident on this channel.
    pub est_latency: u64,
    /// Remaining tile budget. Negative once a channel is over-committed.
    pub tiles_free: i64,
}

#[derive(Error, Debug)]
pub enum AssignmentError {
    #[error(
        "no channel can hold request {request_index} \
         (seq_len {seq_len}, {tiles_needed} tiles; best channel has {max_tiles_free} free)"
    )]
    CapacityExhausted {
        request_index: usize,
        seq_len: u32,
        tiles_needed: u64,
        max_tiles_free: i64,
    },
}

/// The core assignment trait.
///
/// Implement this trait to create custom placement strategies. The scheduler
/// calls [`assign`](AssignmentAlgorithm::assign) once per cycle with every
/// queued request; the returned vector is index-aligned with `queued`.
pub trait AssignmentAlgorithm: Send + Sync {
    /// Pick a channel for every queued request.
    fn assign(
        &mut self,
        queued: &[RequestCost],
        channels: &mut [ChannelLoad],
    ) -> Result<Vec<u32>, AssignmentError>;

    /// Short name used in config files and snapshot filenames.
    fn name(&self) -> &str;
}
