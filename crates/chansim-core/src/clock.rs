//! Virtual clock for the simulation.
//!
//! The [`SimClock`] counts elapsed device cycles independently of wall-clock
//! time, advancing only when the engine steps. This keeps runs deterministic
//! and repeatable regardless of host machine speed.

use serde::{Deserialize, Serialize};

/// Virtual simulation clock, in device cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimClock {
    current_cycle: u64,
}

impl SimClock {
    /// Create a new clock starting at cycle zero.
    pub fn new() -> Self {
        Self { current_cycle: 0 }
    }

    /// Current cycle count.
    pub fn now(&self) -> u64 {
        self.current_cycle
    }

    /// Advance the clock by a number of cycles.
    pub fn advance_by(&mut self, cycles: u64) {
        self.current_cycle += cycles;
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clock_starts_at_zero() {
        let clock = SimClock::new();
        assert_eq!(clock.now(), 0);
    }

    #[test]
    fn test_advance_by_accumulates() {
        let mut clock = SimClock::new();
        clock.advance_by(10);
        clock.advance_by(25);
        assert_eq!(clock.now(), 35);
    }

    #[test]
    fn test_advance_by_zero_is_noop() {
        let mut clock = SimClock::new();
        clock.advance_by(0);
        assert_eq!(clock.now(), 0);
    }
}
