mod incumbent;
mod milp;
mod profile;
mod search;
mod stats;

pub use profile::SiteProfile;
pub use stats::SearchStats;

use crate::{
    builder::Instance,
    error::{Result, SelectError},
    model::{Cost, SiteIdx},
    solution::{Assignment, SelectionSet, Solution},
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{fmt, time::Instant};
use strum_macros::{Display, EnumIter, EnumString};

/// How the optimal selection is searched for
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Strategy {
    /// Take the K feasible sites with the smallest weighted contribution
    #[default]
    Reduction,
    /// Exhaustive search over combinations with bound pruning
    BranchAndBound,
    /// Hand the model to a 0-1 programming backend
    Milp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolveOptions {
    pub strategy: Strategy,
    /// Spread branch-and-bound over the rayon pool
    pub parallel: bool,
}

/// A site that breaks the cap for at least one demand point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteViolation {
    pub site: String,
    pub demand: String,
    pub cost: Cost,
}

/// Why no selection exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfeasibleReport {
    pub required: usize,
    pub feasible: usize,
    pub cap: Cost,
    pub violations: Vec<SiteViolation>,
}

impl fmt::Display for InfeasibleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No solution found: {} site(s) required but only {} keep every location within {}ms. \
             Raise the cap or enable more sites.",
            self.required, self.feasible, self.cap
        )
    }
}

#[derive(Debug, Clone)]
pub enum SolveOutcome {
    Optimal(Solution),
    Infeasible(InfeasibleReport),
}

impl SolveOutcome {
    pub fn solution(&self) -> Option<&Solution> {
        match self {
            SolveOutcome::Optimal(solution) => Some(solution),
            SolveOutcome::Infeasible(_) => None,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, SolveOutcome::Infeasible(_))
    }
}

/// Finds the size-K selection that satisfies every cap constraint and
/// minimizes the weighted objective.
///
/// Among selections with equal objective, the one whose identifiers sorted
/// ascending compare smallest wins, whatever the strategy.
pub fn solve(instance: &Instance<'_>, options: &SolveOptions) -> Result<SolveOutcome> {
    let started = Instant::now();
    let scenario = instance.scenario();
    let k = instance.cardinality().rhs;
    log::info!(
        "=== start solving: {} sites, {} locations, k = {}, cap = {}ms, strategy = {} ===",
        scenario.sites().len(),
        scenario.demands().len(),
        k,
        scenario.cap(),
        options.strategy
    );

    let profiles = profile::profile_sites(instance)?;
    let (feasible, infeasible): (Vec<&SiteProfile>, Vec<&SiteProfile>) =
        profiles.iter().partition(|p| p.feasible);
    log::info!(
        "{} of {} sites are within the cap for every location",
        feasible.len(),
        profiles.len()
    );

    if feasible.len() < k {
        let violations = infeasible
            .iter()
            .filter_map(|p| {
                p.worst.map(|(demand, cost)| SiteViolation {
                    site: p.name.clone(),
                    demand: scenario.demand(demand).name().to_string(),
                    cost,
                })
            })
            .collect();
        let report = InfeasibleReport {
            required: k,
            feasible: feasible.len(),
            cap: scenario.cap(),
            violations,
        };
        log::warn!("{}", report);
        return Ok(SolveOutcome::Infeasible(report));
    }

    let ranked: Vec<&SiteProfile> = feasible
        .into_iter()
        .sorted_by(|a, b| {
            a.contribution
                .cmp(&b.contribution)
                .then_with(|| a.name.cmp(&b.name))
        })
        .collect();

    let mut stats = SearchStats::default();
    let selected = match options.strategy {
        Strategy::Reduction => ranked.iter().take(k).map(|p| p.site).collect(),
        Strategy::BranchAndBound => {
            let (best, search_stats) =
                search::branch_and_bound(instance, &ranked, k, options.parallel)?;
            stats.merge(&search_stats);
            best.ok_or_else(|| {
                SelectError::Solver("branch-and-bound finished without a selection".to_string())
            })?
        }
        Strategy::Milp => {
            let raw = milp::solve_milp(instance)?;
            let selected = canonicalize(&raw, &ranked);
            check_milp_optimal(instance, &selected, &ranked, k)?;
            selected
        }
    };
    stats.sites_pruned = infeasible.len() as u64;
    stats.time_total = started.elapsed();

    let solution = assemble(instance, selected, options.strategy, stats)?;
    log::info!(
        "=== solved: [{}], objective {} ===",
        solution.selection().iter().join(", "),
        solution.objective()
    );
    Ok(SolveOutcome::Optimal(solution))
}

/// Re-picks, within each group of equal contribution, the sites with the
/// smallest identifiers. Keeps the objective of an additive selection.
fn canonicalize(selected: &[SiteIdx], ranked: &[&SiteProfile]) -> Vec<SiteIdx> {
    let mut out = Vec::with_capacity(selected.len());
    for (_, group) in &ranked.iter().chunk_by(|p| p.contribution) {
        let group: Vec<&&SiteProfile> = group.collect();
        let taken = group
            .iter()
            .filter(|p| selected.contains(&p.site))
            .count();
        out.extend(group.iter().take(taken).map(|p| p.site));
    }
    out
}

/// Fails unless `selected` reaches the sum of the `k` smallest feasible
/// contributions; the backend works in f64.
fn check_milp_optimal(
    instance: &Instance<'_>,
    selected: &[SiteIdx],
    ranked: &[&SiteProfile],
    k: usize,
) -> Result<()> {
    let best: u128 = ranked.iter().take(k).map(|p| p.contribution as u128).sum();
    let got = instance.evaluate(selected)?;
    if got as u128 != best {
        return Err(SelectError::Solver(format!(
            "milp returned objective {} but the optimum is {}",
            got, best
        )));
    }
    Ok(())
}

fn assemble(
    instance: &Instance<'_>,
    mut selected: Vec<SiteIdx>,
    strategy: Strategy,
    stats: SearchStats,
) -> Result<Solution> {
    selected.sort_unstable();
    selected.dedup();

    if !instance.is_feasible(&selected) {
        return Err(SelectError::Solver(format!(
            "{} returned a selection that violates the model",
            strategy
        )));
    }

    let scenario = instance.scenario();
    let mut assignments = Vec::with_capacity(selected.len() * scenario.demands().len());
    for &site in &selected {
        for demand in scenario.demand_indices() {
            let point = scenario.demand(demand);
            assignments.push(Assignment {
                demand: point.name().to_string(),
                weight: point.weight(),
                site: scenario.site(site).name().to_string(),
                cost: scenario.cost(demand, site)?,
            });
        }
    }

    let objective = instance.evaluate(&selected)?;
    let selection = SelectionSet::new(
        selected
            .iter()
            .map(|&s| scenario.site(s).name().to_string())
            .collect(),
    );
    Ok(Solution::new(
        selection,
        objective,
        assignments,
        strategy,
        stats,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        builder::build,
        model::{CandidateSite, CostMatrix, DemandPoint, Scenario, Settings, sample_scenario, skewed_scenario},
    };
    use strum::IntoEnumIterator;

    fn all_options() -> Vec<SolveOptions> {
        let mut options: Vec<SolveOptions> = Strategy::iter()
            .map(|strategy| SolveOptions {
                strategy,
                parallel: false,
            })
            .collect();
        options.push(SolveOptions {
            strategy: Strategy::BranchAndBound,
            parallel: true,
        });
        options
    }

    /// Deterministic LCG so random instances are reproducible
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self, bound: u64) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 33) % bound
        }
    }

    fn random_scenario(rng: &mut Lcg, n_sites: usize, n_demands: usize, cap: Cost, k: usize) -> Scenario {
        let sites: Vec<CandidateSite> = (0..n_sites)
            .map(|i| CandidateSite::new(format!("S{i}")))
            .collect();
        let demands: Vec<DemandPoint> = (0..n_demands)
            .map(|i| DemandPoint::new(format!("D{i}"), 1 + rng.next(5)))
            .collect();
        let mut matrix = CostMatrix::new();
        for d in &demands {
            for s in &sites {
                // narrow range so ties happen
                matrix.insert(d.name(), s.name(), 10 * (1 + rng.next(6)));
            }
        }
        let settings = Settings {
            cap,
            k,
            quality_threshold: None,
        };
        Scenario::new(sites, demands, &matrix, settings).unwrap()
    }

    /// Exhaustive oracle: best (objective, sorted names) over all feasible combinations
    fn brute_force(instance: &Instance<'_>) -> Option<(u64, Vec<String>)> {
        let scenario = instance.scenario();
        scenario
            .site_indices()
            .combinations(instance.cardinality().rhs)
            .filter(|c| instance.is_feasible(c))
            .map(|c| {
                let objective = instance.evaluate(&c).unwrap();
                let names: Vec<String> = c
                    .iter()
                    .map(|&s| scenario.site(s).name().to_string())
                    .sorted()
                    .collect();
                (objective, names)
            })
            .min()
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(Strategy::BranchAndBound.to_string(), "branch-and-bound");
        assert_eq!("milp".parse::<Strategy>().unwrap(), Strategy::Milp);
        assert_eq!(Strategy::default(), Strategy::Reduction);
    }

    #[test]
    fn test_single_site_scenario() {
        let scenario = skewed_scenario(100, 1);
        let instance = build(&scenario).unwrap();

        for options in all_options() {
            let outcome = solve(&instance, &options).unwrap();
            let solution = outcome.solution().unwrap();
            assert_eq!(solution.selection().sites(), ["Y".to_string()]);
            assert_eq!(solution.objective(), 1600);
            assert_eq!(solution.strategy(), options.strategy);
        }
    }

    #[test]
    fn test_single_site_tie_picks_smaller_name() {
        // X and Y both total 1600
        let scenario = sample_scenario(100, 1);
        let instance = build(&scenario).unwrap();

        for options in all_options() {
            let outcome = solve(&instance, &options).unwrap();
            let solution = outcome.solution().unwrap();
            assert_eq!(solution.selection().sites(), ["X".to_string()]);
            assert_eq!(solution.objective(), 1600);
        }
    }

    #[test]
    fn test_infeasible_scenario() {
        let scenario = sample_scenario(10, 1);
        let instance = build(&scenario).unwrap();

        for options in all_options() {
            match solve(&instance, &options).unwrap() {
                SolveOutcome::Infeasible(report) => {
                    assert_eq!(report.required, 1);
                    assert_eq!(report.feasible, 0);
                    assert_eq!(report.cap, 10);
                    assert_eq!(report.violations.len(), 2);
                    assert_eq!(report.violations[0].site, "X");
                    assert_eq!(report.violations[0].demand, "C");
                    assert_eq!(report.violations[0].cost, 60);
                }
                SolveOutcome::Optimal(_) => panic!("expected infeasible"),
            }
        }
    }

    #[test]
    fn test_fewer_feasible_sites_than_k() {
        // only X (worst 60) fits under 70, k = 2
        let scenario = sample_scenario(70, 2);
        let instance = build(&scenario).unwrap();

        let outcome = solve(&instance, &SolveOptions::default()).unwrap();
        assert!(outcome.is_infeasible());
        assert!(outcome.solution().is_none());
    }

    #[test]
    fn test_assignments_cover_every_pair() {
        let scenario = sample_scenario(100, 2);
        let instance = build(&scenario).unwrap();

        let outcome = solve(&instance, &SolveOptions::default()).unwrap();
        let solution = outcome.solution().unwrap();
        assert_eq!(solution.selection().len(), 2);
        assert_eq!(solution.objective(), 3200);
        assert_eq!(solution.assignments().len(), 6);

        let weighted: u64 = solution
            .assignments()
            .iter()
            .map(|a| a.weight * a.cost)
            .sum();
        assert_eq!(weighted, solution.objective());
    }

    #[test]
    fn test_ties_break_on_identifier() {
        let sites = vec![
            CandidateSite::new("Gamma"),
            CandidateSite::new("Beta"),
            CandidateSite::new("Alpha"),
        ];
        let demands = vec![DemandPoint::new("D", 1)];
        let mut matrix = CostMatrix::new();
        matrix.insert("D", "Gamma", 10);
        matrix.insert("D", "Beta", 10);
        matrix.insert("D", "Alpha", 10);
        let settings = Settings {
            cap: 100,
            k: 2,
            quality_threshold: None,
        };
        let scenario = Scenario::new(sites, demands, &matrix, settings).unwrap();
        let instance = build(&scenario).unwrap();

        for options in all_options() {
            let outcome = solve(&instance, &options).unwrap();
            let mut names: Vec<&str> = outcome.solution().unwrap().selection().iter().collect();
            names.sort_unstable();
            assert_eq!(names, vec!["Alpha", "Beta"], "{:?}", options);
        }
    }

    #[test]
    fn test_matches_brute_force_on_small_instance() {
        let mut rng = Lcg(7);
        let scenario = random_scenario(&mut rng, 5, 3, 50, 2);
        let instance = build(&scenario).unwrap();
        let expected = brute_force(&instance);

        for options in all_options() {
            let outcome = solve(&instance, &options).unwrap();
            match (&expected, outcome.solution()) {
                (Some((objective, names)), Some(solution)) => {
                    assert_eq!(solution.objective(), *objective);
                    let got: Vec<String> = solution.selection().iter().map(String::from).sorted().collect();
                    assert_eq!(&got, names);
                }
                (None, None) => {}
                (e, s) => panic!("oracle {:?} vs solver {:?}", e, s.map(|s| s.objective())),
            }
        }
    }

    #[test]
    fn test_random_instances_against_brute_force() {
        let mut rng = Lcg(2024);
        for round in 0..40 {
            let n_sites = 3 + rng.next(5) as usize;
            let n_demands = 1 + rng.next(4) as usize;
            let k = 1 + rng.next(n_sites as u64) as usize;
            let cap = 20 + 10 * rng.next(5);
            let scenario = random_scenario(&mut rng, n_sites, n_demands, cap, k);
            let instance = build(&scenario).unwrap();
            let expected = brute_force(&instance);

            for options in all_options() {
                let outcome = solve(&instance, &options).unwrap();
                match (&expected, outcome.solution()) {
                    (Some((objective, names)), Some(solution)) => {
                        assert_eq!(solution.objective(), *objective, "round {round} {:?}", options);
                        let got: Vec<String> =
                            solution.selection().iter().map(String::from).sorted().collect();
                        assert_eq!(&got, names, "round {round} {:?}", options);
                        // feasibility and cardinality
                        assert_eq!(solution.selection().len(), k);
                        assert!(solution.assignments().iter().all(|a| a.cost <= cap));
                    }
                    (None, None) => assert!(outcome.is_infeasible()),
                    (e, _) => panic!("round {round}: oracle {:?} disagrees with {:?}", e, options),
                }
            }
        }
    }

    #[test]
    fn test_repeated_solves_are_identical() {
        let mut rng = Lcg(99);
        let scenario = random_scenario(&mut rng, 8, 4, 60, 3);
        let instance = build(&scenario).unwrap();

        for options in all_options() {
            let first = solve(&instance, &options).unwrap();
            let second = solve(&instance, &options).unwrap();
            assert_eq!(
                first.solution().map(|s| s.selection().clone()),
                second.solution().map(|s| s.selection().clone())
            );
        }
    }

    #[test]
    fn test_branch_and_bound_prunes() {
        let sites: Vec<CandidateSite> = (1..=10)
            .map(|i| CandidateSite::new(format!("S{i:02}")))
            .collect();
        let demands = vec![DemandPoint::new("D", 1)];
        let mut matrix = CostMatrix::new();
        for (i, site) in sites.iter().enumerate() {
            matrix.insert("D", site.name(), 10 * (i as u64 + 1));
        }
        let settings = Settings {
            cap: 1_000,
            k: 2,
            quality_threshold: None,
        };
        let scenario = Scenario::new(sites, demands, &matrix, settings).unwrap();
        let instance = build(&scenario).unwrap();

        let options = SolveOptions {
            strategy: Strategy::BranchAndBound,
            parallel: false,
        };
        let outcome = solve(&instance, &options).unwrap();
        let solution = outcome.solution().unwrap();
        assert_eq!(solution.objective(), 30);

        // root, {S01}, {S01, S02}; everything else is cut by the bound
        let stats = solution.stats();
        assert_eq!(stats.nodes_explored, 3);
        assert_eq!(stats.prunings_bound, 2);
        assert_eq!(stats.solutions_found, 1);
    }

    #[test]
    fn test_infeasible_sites_counted() {
        let scenario = sample_scenario(70, 1);
        let instance = build(&scenario).unwrap();

        let outcome = solve(&instance, &SolveOptions::default()).unwrap();
        let solution = outcome.solution().unwrap();
        assert_eq!(solution.selection().sites(), ["X".to_string()]);
        assert_eq!(solution.stats().sites_pruned, 1);
    }

    #[test]
    fn test_suboptimal_milp_answer_rejected() {
        let scenario = skewed_scenario(100, 1);
        let instance = build(&scenario).unwrap();
        let profiles = profile::profile_sites(&instance).unwrap();
        let ranked: Vec<&SiteProfile> = profiles
            .iter()
            .sorted_by_key(|p| (p.contribution, p.name.clone()))
            .collect();

        // Y (1600) is optimal, X (1650) is not
        assert!(check_milp_optimal(&instance, &[SiteIdx(1)], &ranked, 1).is_ok());
        assert!(matches!(
            check_milp_optimal(&instance, &[SiteIdx(0)], &ranked, 1),
            Err(SelectError::Solver(_))
        ));
    }

    #[test]
    fn test_canonicalize_prefers_smaller_names() {
        let profile = |site: usize, name: &str, contribution: u64| SiteProfile {
            site: SiteIdx(site),
            name: name.to_string(),
            feasible: true,
            contribution,
            worst: None,
        };
        let a = profile(0, "A", 5);
        let b = profile(1, "B", 7);
        let c = profile(2, "C", 7);
        let d = profile(3, "D", 9);
        let ranked = vec![&a, &b, &c, &d];

        assert_eq!(
            canonicalize(&[SiteIdx(0), SiteIdx(2)], &ranked),
            vec![SiteIdx(0), SiteIdx(1)]
        );
        assert_eq!(
            canonicalize(&[SiteIdx(3), SiteIdx(2)], &ranked),
            vec![SiteIdx(1), SiteIdx(3)]
        );
    }
}
