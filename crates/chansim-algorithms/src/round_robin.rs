//! Naive round-robin assignment.
//!
//! The simplest placement strategy: hand each request to the next channel in
//! a circular rotation. Provides even request counts but ignores channel
//! state entirely; long and short requests weigh the same, and a channel's
//! tile budget is never consulted, so it can over-commit memory.

use crate::traits::*;

/// Naive round-robin placement.
///
/// The cursor persists across assignment passes, so the rotation continues
/// where the previous cycle left off rather than restarting at channel 0.
pub struct NaiveRoundRobin {
    cursor: usize,
}

impl NaiveRoundRobin {
    pub fn new() -> Self {
        Self { cursor: 0 }
    }
}

impl Default for NaiveRoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignmentAlgorithm for NaiveRoundRobin {
    fn assign(
        &mut self,
        queued: &[RequestCost],
        channels: &mut [ChannelLoad],
    ) -> Result<Vec<u32>, AssignmentError> {
        debug_assert!(!channels.is_empty());

        let mut choices = Vec::with_capacity(queued.len());
        for cost in queued {
            let ch = self.cursor;
            channels[ch].est_latency += cost.est_latency;
            channels[ch].tiles_free -= cost.tiles as i64;
            self.cursor = (ch + 1) % channels.len();
            choices.push(ch as u32);
        }
        Ok(choices)
    }

    fn name(&self) -> &str {
        "rrn"
    }
}
