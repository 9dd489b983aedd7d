use crate::{
    engine::{SearchStats, Strategy},
    model::{Cost, Weight},
};

/// Exactly K selected site identifiers, in catalog order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    sites: Vec<String>,
}

impl SelectionSet {
    pub(crate) fn new(sites: Vec<String>) -> Self {
        Self { sites }
    }

    pub fn sites(&self) -> &[String] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.sites.iter().map(String::as_str)
    }
}

/// Realized cost between one demand point and one selected site
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub demand: String,
    pub weight: Weight,
    pub site: String,
    pub cost: Cost,
}

/// Result of a successful solve
#[derive(Debug, Clone)]
pub struct Solution {
    selection: SelectionSet,
    objective: u64,
    assignments: Vec<Assignment>,
    strategy: Strategy,
    stats: SearchStats,
}

impl Solution {
    pub(crate) fn new(
        selection: SelectionSet,
        objective: u64,
        assignments: Vec<Assignment>,
        strategy: Strategy,
        stats: SearchStats,
    ) -> Self {
        Self {
            selection,
            objective,
            assignments,
            strategy,
            stats,
        }
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Weighted total latency over all selected sites and demand points
    pub fn objective(&self) -> u64 {
        self.objective
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }
}
