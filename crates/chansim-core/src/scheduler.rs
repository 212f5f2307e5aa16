//! Batch scheduler: keeps the in-flight batch full and places new requests.
//!
//! Each step retires finished requests, draws replacements from the candidate
//! pool (with replacement, seeded), and runs the configured assignment
//! algorithm over the queue. Channel state is never stored; it is re-derived
//! from the batch through [`ChannelAccounting`] so the books cannot drift.

use crate::accounting::{ChannelAccounting, InvariantViolation};
use crate::cost::CostModel;
use crate::engine::SimError;
use crate::request::Request;
use chansim_algorithms::{AssignmentAlgorithm, RequestCost};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

pub struct Scheduler {
    candidates: Vec<Request>,
    queued: Vec<Request>,
    ongoing: Vec<Request>,
    algorithm: Box<dyn AssignmentAlgorithm>,
    cost: CostModel,
    rng: ChaCha8Rng,
    num_channels: u32,
    batch_size: usize,
}

impl Scheduler {
    pub fn new(
        candidates: Vec<Request>,
        cost: CostModel,
        algorithm: Box<dyn AssignmentAlgorithm>,
        num_channels: u32,
        batch_size: u32,
        seed: u64,
    ) -> Self {
        Scheduler {
            candidates,
            queued: Vec::new(),
            ongoing: Vec::with_capacity(batch_size as usize),
            algorithm,
            cost,
            rng: ChaCha8Rng::seed_from_u64(seed),
            num_channels,
            batch_size: batch_size as usize,
        }
    }

    /// Advance every in-flight request by `ticks` generated tokens and retire
    /// the ones that finish.
    pub fn progress(&mut self, ticks: u64) {
        for _ in 0..ticks {
            for request in &mut self.ongoing {
                if !request.is_done() {
                    request.increment();
                }
            }
        }
        self.ongoing.retain(|request| !request.is_done());
    }

    /// Fail if any channel is over its tile budget.
    pub fn check_capacity(&self) -> Result<(), InvariantViolation> {
        self.accounting().check()
    }

    /// Draw fresh requests from the candidate pool until the batch is full.
    pub fn replenish(&mut self) {
        debug_assert!(self.queued.is_empty(), "replenish with queued requests");
        debug_assert!(!self.candidates.is_empty(), "empty candidate pool");
        let need = self.batch_size.saturating_sub(self.ongoing.len());
        for _ in 0..need {
            let idx = self.rng.gen_range(0..self.candidates.len());
            self.queued.push(self.candidates[idx].clone());
        }
    }

    /// Place every queued request on a channel and fold it into the batch.
    pub fn assign(&mut self) -> Result<(), SimError> {
        debug_assert_eq!(
            self.queued.len() + self.ongoing.len(),
            self.batch_size,
            "assign on a partially replenished batch",
        );
        if self.queued.is_empty() {
            return Ok(());
        }

        let mut channels = self.accounting().channel_loads();
        let queued_costs: Vec<RequestCost> = self
            .queued
            .iter()
            .map(|request| {
                let seq_len = request.seq_len(self.cost.max_seq_len());
                RequestCost {
                    seq_len,
                    tiles: self.cost.tiles_used(seq_len),
                    est_latency: self.cost.estimated_latency(seq_len),
                }
            })
            .collect();

        let choices = self.algorithm.assign(&queued_costs, &mut channels)?;
        debug_assert_eq!(choices.len(), queued_costs.len());
        for (mut request, ch) in self.queued.drain(..).zip(choices) {
            request.assign(ch);
            self.ongoing.push(request);
        }

        self.check_capacity()?;
        Ok(())
    }

    /// Fresh occupancy tally for the in-flight batch.
    pub fn accounting(&self) -> ChannelAccounting {
        ChannelAccounting::collect(&self.ongoing, &self.cost, self.num_channels)
    }

    pub fn ongoing(&self) -> &[Request] {
        &self.ongoing
    }

    pub fn queued(&self) -> &[Request] {
        &self.queued
    }

    pub fn candidates(&self) -> &[Request] {
        &self.candidates
    }

    pub fn cost(&self) -> &CostModel {
        &self.cost
    }

    pub fn algorithm_name(&self) -> &str {
        self.algorithm.name()
    }
}
