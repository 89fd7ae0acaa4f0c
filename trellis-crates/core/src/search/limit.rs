//! A [`SearchLimit`] is polled by the search before every node activation. It indicates when the
//! search should stop, even if the search space has not been exhausted; the search then reports
//! [`super::SearchResult::LimitReached`].
use std::fmt::Debug;
use std::time::Duration;
use std::time::Instant;

pub trait SearchLimit: Debug {
    /// Returns `true` when the search should stop, `false` otherwise.
    fn should_stop(&mut self) -> bool;

    fn node_activated(&mut self) {}

    fn failure_occurred(&mut self) {}

    fn solution_found(&mut self) {}
}

impl<T: SearchLimit> SearchLimit for Option<T> {
    fn should_stop(&mut self) -> bool {
        match self {
            Some(limit) => limit.should_stop(),
            None => false,
        }
    }

    fn node_activated(&mut self) {
        if let Some(limit) = self {
            limit.node_activated()
        }
    }

    fn failure_occurred(&mut self) {
        if let Some(limit) = self {
            limit.failure_occurred()
        }
    }

    fn solution_found(&mut self) {
        if let Some(limit) = self {
            limit.solution_found()
        }
    }
}

/// Never stops the search.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLimit;

impl SearchLimit for NoLimit {
    fn should_stop(&mut self) -> bool {
        false
    }
}

/// Stops after a number of node activations.
#[derive(Clone, Copy, Debug)]
pub struct NodeLimit {
    budget: u64,
    num_activations: u64,
}

impl NodeLimit {
    pub fn new(budget: u64) -> Self {
        NodeLimit {
            budget,
            num_activations: 0,
        }
    }
}

impl SearchLimit for NodeLimit {
    fn should_stop(&mut self) -> bool {
        self.num_activations >= self.budget
    }

    fn node_activated(&mut self) {
        self.num_activations += 1;
    }
}

/// Stops after a number of failed nodes.
#[derive(Clone, Copy, Debug)]
pub struct FailureLimit {
    budget: u64,
    num_failures: u64,
}

impl FailureLimit {
    pub fn new(budget: u64) -> Self {
        FailureLimit {
            budget,
            num_failures: 0,
        }
    }
}

impl SearchLimit for FailureLimit {
    fn should_stop(&mut self) -> bool {
        self.num_failures >= self.budget
    }

    fn failure_occurred(&mut self) {
        self.num_failures += 1;
    }
}

/// Stops after a number of solutions.
#[derive(Clone, Copy, Debug)]
pub struct SolutionLimit {
    budget: u64,
    num_solutions: u64,
}

impl SolutionLimit {
    pub fn new(budget: u64) -> Self {
        SolutionLimit {
            budget,
            num_solutions: 0,
        }
    }
}

impl SearchLimit for SolutionLimit {
    fn should_stop(&mut self) -> bool {
        self.num_solutions >= self.budget
    }

    fn solution_found(&mut self) {
        self.num_solutions += 1;
    }
}

/// Stops once the time budget has been exceeded.
#[derive(Clone, Copy, Debug)]
pub struct TimeLimit {
    started_at: Instant,
    budget: Duration,
}

impl TimeLimit {
    /// A time budget which starts counting now.
    pub fn starting_now(budget: Duration) -> Self {
        TimeLimit {
            started_at: Instant::now(),
            budget,
        }
    }
}

impl SearchLimit for TimeLimit {
    fn should_stop(&mut self) -> bool {
        self.started_at.elapsed() >= self.budget
    }
}

/// Stops when either of two limits stops.
#[derive(Clone, Copy, Debug)]
pub struct Combinator<L1, L2> {
    first: L1,
    second: L2,
}

impl<L1, L2> Combinator<L1, L2> {
    pub fn new(first: L1, second: L2) -> Self {
        Combinator { first, second }
    }
}

impl<L1: SearchLimit, L2: SearchLimit> SearchLimit for Combinator<L1, L2> {
    fn should_stop(&mut self) -> bool {
        self.first.should_stop() || self.second.should_stop()
    }

    fn node_activated(&mut self) {
        self.first.node_activated();
        self.second.node_activated();
    }

    fn failure_occurred(&mut self) {
        self.first.failure_occurred();
        self.second.failure_occurred();
    }

    fn solution_found(&mut self) {
        self.first.solution_found();
        self.second.solution_found();
    }
}
