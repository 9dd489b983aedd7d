use std::time::Duration;

/// Counters collected during one solve
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Sites removed up front because they break the cap for some location.
    pub sites_pruned: u64,
    /// Search nodes visited (branch-and-bound only).
    pub nodes_explored: u64,
    /// Subtrees cut because their lower bound exceeded the incumbent.
    pub prunings_bound: u64,
    /// Complete selections rejected by the constraint check.
    pub prunings_infeasible: u64,
    /// Incumbent improvements.
    pub solutions_found: u64,
    pub time_total: Duration,
}

impl SearchStats {
    #[inline]
    pub fn on_node_explored(&mut self) {
        self.nodes_explored = self.nodes_explored.saturating_add(1);
    }

    #[inline]
    pub fn on_pruning_bound(&mut self) {
        self.prunings_bound = self.prunings_bound.saturating_add(1);
    }

    #[inline]
    pub fn on_pruning_infeasible(&mut self) {
        self.prunings_infeasible = self.prunings_infeasible.saturating_add(1);
    }

    #[inline]
    pub fn on_solution_found(&mut self) {
        self.solutions_found = self.solutions_found.saturating_add(1);
    }

    /// Folds counters of a worker into this one
    pub fn merge(&mut self, other: &SearchStats) {
        self.sites_pruned = self.sites_pruned.saturating_add(other.sites_pruned);
        self.nodes_explored = self.nodes_explored.saturating_add(other.nodes_explored);
        self.prunings_bound = self.prunings_bound.saturating_add(other.prunings_bound);
        self.prunings_infeasible = self
            .prunings_infeasible
            .saturating_add(other.prunings_infeasible);
        self.solutions_found = self.solutions_found.saturating_add(other.solutions_found);
    }
}
