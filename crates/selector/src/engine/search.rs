//! Depth-first branch-and-bound over K-combinations of feasible sites.
//!
//! Leaves are checked against the full instance (constraints and objective),
//! so the search does not rely on the objective being a plain sum of site
//! contributions. Contributions only feed the lower bound.

use super::{
    incumbent::{Incumbent, SharedIncumbent},
    profile::SiteProfile,
    stats::SearchStats,
};
use crate::{builder::Instance, error::Result, model::SiteIdx};
use rayon::prelude::*;

struct Search<'s, 'a> {
    instance: &'s Instance<'a>,
    /// Sorted ascending by contribution
    ranked: &'s [&'s SiteProfile],
    /// prefix[i] = Σ contribution(ranked[..i])
    prefix: Vec<u128>,
    k: usize,
    incumbent: &'s SharedIncumbent,
}

impl Search<'_, '_> {
    /// Cheapest completion that takes `ranked[i]` next and `remaining - 1`
    /// further sites after it
    fn bound(&self, partial: u64, i: usize, remaining: usize) -> u128 {
        partial as u128 + (self.prefix[i + remaining] - self.prefix[i])
    }

    fn dfs(
        &self,
        start: usize,
        chosen: &mut Vec<usize>,
        partial: u64,
        stats: &mut SearchStats,
    ) -> Result<()> {
        stats.on_node_explored();

        if chosen.len() == self.k {
            return self.leaf(chosen, stats);
        }

        let remaining = self.k - chosen.len();
        for i in start..=self.ranked.len() - remaining {
            // bounds only grow with i since ranked is ascending
            if self.bound(partial, i, remaining) > self.incumbent.upper_bound() as u128 {
                stats.on_pruning_bound();
                break;
            }

            chosen.push(i);
            let next = partial.saturating_add(self.ranked[i].contribution);
            self.dfs(i + 1, chosen, next, stats)?;
            chosen.pop();
        }
        Ok(())
    }

    fn leaf(&self, chosen: &[usize], stats: &mut SearchStats) -> Result<()> {
        let selection: Vec<SiteIdx> = chosen.iter().map(|&i| self.ranked[i].site).collect();
        if !self.instance.is_feasible(&selection) {
            stats.on_pruning_infeasible();
            return Ok(());
        }

        let objective = self.instance.evaluate(&selection)?;
        let mut key: Vec<String> = chosen
            .iter()
            .map(|&i| self.ranked[i].name.clone())
            .collect();
        key.sort_unstable();

        let installed = self.incumbent.try_install(Incumbent {
            objective,
            selection,
            key,
        });
        if installed {
            stats.on_solution_found();
            log::debug!("new incumbent: objective {}", objective);
        }
        Ok(())
    }
}

/// Returns the best selection over `ranked`, or `None` if fewer than `k`
/// sites are available.
pub(crate) fn branch_and_bound(
    instance: &Instance<'_>,
    ranked: &[&SiteProfile],
    k: usize,
    parallel: bool,
) -> Result<(Option<Vec<SiteIdx>>, SearchStats)> {
    let mut stats = SearchStats::default();
    if k == 0 || ranked.len() < k {
        return Ok((None, stats));
    }

    let mut prefix = Vec::with_capacity(ranked.len() + 1);
    prefix.push(0u128);
    for p in ranked {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + p.contribution as u128);
    }

    let incumbent = SharedIncumbent::new();
    let search = Search {
        instance,
        ranked,
        prefix,
        k,
        incumbent: &incumbent,
    };

    if parallel {
        // one task per first site; workers share only the incumbent
        let roots = ranked.len() - k + 1;
        let worker_stats = (0..roots)
            .into_par_iter()
            .map(|i| {
                let mut local = SearchStats::default();
                if search.bound(0, i, k) > search.incumbent.upper_bound() as u128 {
                    local.on_pruning_bound();
                    return Ok(local);
                }
                let mut chosen = vec![i];
                search.dfs(i + 1, &mut chosen, ranked[i].contribution, &mut local)?;
                Ok(local)
            })
            .collect::<Result<Vec<_>>>()?;
        for local in &worker_stats {
            stats.merge(local);
        }
    } else {
        let mut chosen = Vec::with_capacity(k);
        search.dfs(0, &mut chosen, 0, &mut stats)?;
    }

    Ok((incumbent.into_inner().map(|inc| inc.selection), stats))
}
