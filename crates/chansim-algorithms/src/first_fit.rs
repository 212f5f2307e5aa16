//! Capacity-aware round-robin assignment (first fit).
//!
//! Like the naive rotation, but a channel is only chosen if its remaining
//! tile budget can hold the request. The scan starts at the cursor and wraps
//! across all channels; if none fits, assignment fails: the simulation has
//! genuinely run out of memory and there is no way to continue.

use crate::traits::*;

/// First-fit round-robin placement.
///
/// The cursor advances past each chosen channel and persists across passes,
/// so consecutive requests spiral around the channels instead of piling onto
/// the first one with room.
pub struct FirstFitRoundRobin {
    cursor: usize,
}

impl FirstFitRoundRobin {
    pub fn new() -> Self {
        Self { cursor: 0 }
    }
}

impl Default for FirstFitRoundRobin {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignmentAlgorithm for FirstFitRoundRobin {
    fn assign(
        &mut self,
        queued: &[RequestCost],
        channels: &mut [ChannelLoad],
    ) -> Result<Vec<u32>, AssignmentError> {
        debug_assert!(!channels.is_empty());

        let n = channels.len();
        let mut choices = Vec::with_capacity(queued.len());
        for (i, cost) in queued.iter().enumerate() {
            let need = cost.tiles as i64;
            let mut chosen = None;
            for offset in 0..n {
                let ch = (self.cursor + offset) % n;
                if channels[ch].tiles_free >= need {
                    chosen = Some(ch);
                    break;
                }
            }
            let ch = chosen.ok_or_else(|| AssignmentError::CapacityExhausted {
                request_index: i,
                seq_len: cost.seq_len,
                tiles_needed: cost.tiles,
                max_tiles_free: channels.iter().map(|c| c.tiles_free).max().unwrap_or(0),
            })?;

            channels[ch].est_latency += cost.est_latency;
            channels[ch].tiles_free -= need;
            self.cursor = (ch + 1) % n;
            choices.push(ch as u32);
        }
        Ok(choices)
    }

    fn name(&self) -> &str {
        "rr"
    }
}
