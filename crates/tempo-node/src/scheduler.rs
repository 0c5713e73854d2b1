//! Per-tick action selection
//!
//! When the inbound queue is empty, the scheduler asks a policy what to do
//! with the tick. The policy seam exists so tests can script the exact
//! action sequence instead of sampling.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// What a node does with one idle tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Send to the peer with this rank in ascending id order.
    /// Out-of-range ranks saturate to the smallest peer.
    SendTo(usize),
    /// Send to every peer in ascending id order, one clock increment each
    Broadcast,
    /// Increment the clock with no peer interaction
    Internal,
}

/// Action source consulted once per idle tick
pub trait ActionPolicy: Send {
    fn next_action(&mut self) -> Action;
}

/// The simulation's distribution: draw from [1,10].
/// 1 sends to the smallest peer, 2 to the second smallest, 3 broadcasts,
/// anything else is an internal step (probability 0.7).
pub struct UniformPolicy {
    rng: StdRng,
}

impl UniformPolicy {
    pub fn new() -> Self {
        UniformPolicy {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        UniformPolicy {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for UniformPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionPolicy for UniformPolicy {
    fn next_action(&mut self) -> Action {
        match self.rng.gen_range(1..=10) {
            1 => Action::SendTo(0),
            2 => Action::SendTo(1),
            3 => Action::Broadcast,
            _ => Action::Internal,
        }
    }
}

/// Replays a fixed action sequence, then falls back to internal steps.
/// Deterministic policy for tests.
pub struct ScriptedPolicy {
    script: VecDeque<Action>,
}

impl ScriptedPolicy {
    pub fn new(actions: impl IntoIterator<Item = Action>) -> Self {
        ScriptedPolicy {
            script: actions.into_iter().collect(),
        }
    }
}

impl ActionPolicy for ScriptedPolicy {
    fn next_action(&mut self) -> Action {
        self.script.pop_front().unwrap_or(Action::Internal)
    }
}
