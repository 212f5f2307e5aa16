//! Built-in channel assignment algorithms for chansim.
//!
//! This crate provides the [`AssignmentAlgorithm`] trait and the three
//! built-in placement policies for batched LLM inference over PIM memory
//! channels:
//!
//! | Name  | Strategy | Notes |
//! |-------|----------|-------|
//! | `rr`  | [`FirstFitRoundRobin`]: rotate, skip channels without room | Fails hard when nothing fits |
//! | `rrn` | [`NaiveRoundRobin`]: rotate blindly | Can over-commit channel memory |
//! | `clb` | [`LoadBalancing`]: longest request to least-loaded channel | Best latency spread |

pub mod first_fit;
pub mod load_balancing;
pub mod round_robin;
pub mod traits;

pub use first_fit::FirstFitRoundRobin;
pub use load_balancing::LoadBalancing;
pub use round_robin::NaiveRoundRobin;
pub use traits::*;

/// Create an assignment algorithm by name.
pub fn algorithm_by_name(name: &str) -> Option<Box<dyn AssignmentAlgorithm>> {
    match name {
        "rr" => Some(Box::new(FirstFitRoundRobin::new())),
        "rrn" => Some(Box::new(NaiveRoundRobin::new())),
        "clb" => Some(Box::new(LoadBalancing::new())),
        _ => None,
    }
}

/// List all available built-in algorithm names.
pub fn available_algorithms() -> Vec<&'static str> {
    vec!["rr", "rrn", "clb"]
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Helper to create N idle channels with the given tile budget.
    pub fn make_channels(n: usize, tiles_free: i64) -> Vec<ChannelLoad> {
        (0..n)
            .map(|_| ChannelLoad {
                est_latency: 0,
                tiles_free,
            })
            .collect()
    }

    /// Helper to create N identical queued requests.
    pub fn uniform_queued(n: usize, tiles: u64) -> Vec<RequestCost> {
        (0..n)
            .map(|_| RequestCost {
                seq_len: 32,
                tiles,
                est_latency: 27_320,
            })
            .collect()
    }

    #[test]
    fn test_algorithm_by_name() {
        for name in available_algorithms() {
            let algo = algorithm_by_name(name).unwrap_or_else(|| panic!("Missing: {}", name));
            assert_eq!(algo.name(), name);
        }
        assert!(algorithm_by_name("nonexistent").is_none());
        assert!(algorithm_by_name("xyz").is_none());
    }

    #[test]
    fn test_available_algorithms_not_empty() {
        assert!(!available_algorithms().is_empty());
    }
}
