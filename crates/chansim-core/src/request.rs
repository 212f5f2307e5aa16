//! Request model for the batched inference simulation.
//!
//! Each [`Request`] is a single inference call described purely by token
//! counts: a fixed prompt, a fixed generation budget, and a running count of
//! tokens generated so far. Requests are value types; replenishment clones
//! a candidate from the dataset pool, and the clone's progress and channel
//! never touch the original.

use serde::{Deserialize, Serialize};

/// A single inference request flowing through the simulated batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Number of tokens in the prompt.
    input_tokens: u32,
    /// Number of tokens this request will generate before finishing.
    output_tokens: u32,
    /// Tokens generated so far.
    generated_tokens: u32,
    /// Memory channel holding this request's KV data, set exactly once.
    channel: Option<u32>,
}

impl Request {
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            generated_tokens: 0,
            channel: None,
        }
    }

    pub fn input_tokens(&self) -> u32 {
        self.input_tokens
    }

    pub fn output_tokens(&self) -> u32 {
        self.output_tokens
    }

    pub fn generated_tokens(&self) -> u32 {
        self.generated_tokens
    }

    pub fn channel(&self) -> Option<u32> {
        self.channel
    }

    /// Effective sequence length: prompt plus generated tokens, capped at
    /// the model's context window.
    pub fn seq_len(&self, max_seq_len: u32) -> u32 {
        self.input_tokens
            .saturating_add(self.generated_tokens)
            .min(max_seq_len)
    }

    /// Whether generation is complete.
    pub fn is_done(&self) -> bool {
        self.generated_tokens == self.output_tokens
    }

    /// Generate one token.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if the request has already finished.
    pub fn increment(&mut self) {
        debug_assert!(
            self.generated_tokens < self.output_tokens,
            "increment on a finished request",
        );
        self.generated_tokens += 1;
    }

    /// Bind the request to a memory channel.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if a channel was already assigned.
    pub fn assign(&mut self, channel: u32) {
        debug_assert!(self.channel.is_none(), "channel assigned twice");
        self.channel = Some(channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_len_grows_with_generation() {
        let mut req = Request::new(100, 50);
        assert_eq!(req.seq_len(2048), 100);
        req.increment();
        req.increment();
        assert_eq!(req.seq_len(2048), 102);
    }

    #[test]
    fn test_seq_len_caps_at_max() {
        let mut req = Request::new(2040, 50);
        for _ in 0..20 {
            req.increment();
        }
        assert_eq!(req.seq_len(2048), 2048);
    }

    #[test]
    fn test_completion() {
        let mut req = Request::new(10, 3);
        assert!(!req.is_done());
        req.increment();
        req.increment();
        assert!(!req.is_done());
        req.increment();
        assert!(req.is_done());
    }

    #[test]
    #[should_panic(expected = "increment on a finished request")]
    fn test_increment_past_done_panics() {
        let mut req = Request::new(10, 1);
        req.increment();
        req.increment();
    }

    #[test]
    fn test_channel_set_once() {
        let mut req = Request::new(10, 5);
        assert_eq!(req.channel(), None);
        req.assign(7);
        assert_eq!(req.channel(), Some(7));
    }

    #[test]
    #[should_panic(expected = "channel assigned twice")]
    fn test_reassign_panics() {
        let mut req = Request::new(10, 5);
        req.assign(1);
        req.assign(2);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = Request::new(100, 50);
        let mut copy = original.clone();
        copy.increment();
        copy.assign(3);
        assert_eq!(original.generated_tokens(), 0);
        assert_eq!(original.channel(), None);
    }
}
