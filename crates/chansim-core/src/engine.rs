//! Simulation engine: the cycle loop over a constantly-refilled batch.
//!
//! A [`Simulation`] wires the clock, cost model, and scheduler together. One
//! `advance` call is one step of the reference pipeline: generate tokens,
//! retire finished requests, audit channel occupancy, refill the batch, and
//! place the refill on channels.

use crate::accounting::{ChannelAccounting, InvariantViolation};
use crate::clock::SimClock;
use crate::config::{ConfigError, SimConfig};
use crate::cost::CostModel;
use crate::request::Request;
use crate::scheduler::Scheduler;
use crate::trace::{Snapshot, SnapshotRow, TraceError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Assignment(#[from] chansim_algorithms::AssignmentError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
    #[error(transparent)]
    Trace(#[from] TraceError),
}

pub struct Simulation {
    config: SimConfig,
    clock: SimClock,
    scheduler: Scheduler,
}

impl Simulation {
    /// Build a simulation and fill the initial batch.
    ///
    /// The candidate pool is sampled with replacement, so it may be any size;
    /// it only needs at least one usable request.
    pub fn new(config: SimConfig, candidates: Vec<Request>) -> Result<Self, SimError> {
        let algorithm = chansim_algorithms::algorithm_by_name(&config.simulation.algorithm)
            .ok_or_else(|| ConfigError::UnknownAlgorithm(config.simulation.algorithm.clone()))?;
        if candidates.is_empty() {
            return Err(ConfigError::Validation("candidate pool is empty".to_string()).into());
        }
        let cost = CostModel::new(&config.model, &config.memory)?;
        let scheduler = Scheduler::new(
            candidates,
            cost,
            algorithm,
            config.memory.num_channels,
            config.simulation.batch_size,
            config.simulation.seed,
        );
        let mut sim = Simulation {
            config,
            clock: SimClock::new(),
            scheduler,
        };
        // Zero-tick step: fills and places the first batch.
        sim.advance(0)?;
        Ok(sim)
    }

    /// Advance the simulation by `ticks` generated tokens per request.
    pub fn advance(&mut self, ticks: u64) -> Result<(), SimError> {
        self.clock.advance_by(ticks);
        self.scheduler.progress(ticks);
        // Sequence lengths grew, so occupancy can overflow before any
        // new placement happens.
        self.scheduler.check_capacity()?;
        self.scheduler.replenish();
        self.scheduler.assign()?;
        Ok(())
    }

    /// Per-request view of the current batch for export.
    pub fn snapshot(&self) -> Snapshot {
        let max_seq_len = self.scheduler.cost().max_seq_len();
        let rows = self
            .scheduler
            .ongoing()
            .iter()
            .map(|request| SnapshotRow {
                seq_len: request.seq_len(max_seq_len),
                ch_idx: request.channel().unwrap_or(0),
            })
            .collect();
        Snapshot {
            cycle: self.clock.now(),
            rows,
        }
    }

    pub fn accounting(&self) -> ChannelAccounting {
        self.scheduler.accounting()
    }

    pub fn cycle(&self) -> u64 {
        self.clock.now()
    }

    pub fn ongoing(&self) -> &[Request] {
        self.scheduler.ongoing()
    }

    pub fn queued(&self) -> &[Request] {
        self.scheduler.queued()
    }

    pub fn candidates(&self) -> &[Request] {
        self.scheduler.candidates()
    }

    pub fn algorithm_name(&self) -> &str {
        self.scheduler.algorithm_name()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn cost(&self) -> &CostModel {
        self.scheduler.cost()
    }
}
