use crate::{
    error::Result,
    model::{Cost, Scenario},
};
use std::fmt;

/// A site whose best latency to any location is at or above the threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectivityWarning {
    pub site: String,
    pub best_demand: String,
    pub best_cost: Cost,
    pub threshold: Cost,
}

impl fmt::Display for ConnectivityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No location with latency less than {} for site: {} (best: {} at {}ms). Recommend improving the internet connection.",
            self.threshold, self.site, self.best_demand, self.best_cost
        )
    }
}

/// Scans with the scenario's own quality threshold; no threshold, no warnings.
pub fn scan(scenario: &Scenario) -> Result<Vec<ConnectivityWarning>> {
    match scenario.quality_threshold() {
        Some(threshold) => scan_with_threshold(scenario, threshold),
        None => Ok(Vec::new()),
    }
}

/// Flags every site whose minimum cost over all demand points is >= `threshold`.
///
/// Advisory only: the result never influences feasibility or the solve.
pub fn scan_with_threshold(scenario: &Scenario, threshold: Cost) -> Result<Vec<ConnectivityWarning>> {
    let mut warnings = Vec::new();

    for site in scenario.site_indices() {
        let mut best: Option<(usize, Cost)> = None;
        for demand in scenario.demand_indices() {
            let cost = scenario.cost(demand, site)?;
            if best.is_none_or(|(_, c)| cost < c) {
                best = Some((demand.0, cost));
            }
        }

        if let Some((demand, best_cost)) = best {
            if best_cost >= threshold {
                warnings.push(ConnectivityWarning {
                    site: scenario.site(site).name().to_string(),
                    best_demand: scenario.demands()[demand].name().to_string(),
                    best_cost,
                    threshold,
                });
            }
        }
    }

    Ok(warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample_scenario;

    #[test]
    fn test_no_threshold_no_warnings() {
        let scenario = sample_scenario(100, 1);
        assert!(scan(&scenario).unwrap().is_empty());
    }

    #[test]
    fn test_poorly_connected_site_flagged() {
        let scenario = sample_scenario(100, 1);

        // X: min 40 (B), Y: min 20 (C)
        let warnings = scan_with_threshold(&scenario, 30).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].site, "X");
        assert_eq!(warnings[0].best_demand, "B");
        assert_eq!(warnings[0].best_cost, 40);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let scenario = sample_scenario(100, 1);
        let warnings = scan_with_threshold(&scenario, 20).unwrap();
        let sites: Vec<&str> = warnings.iter().map(|w| w.site.as_str()).collect();
        assert_eq!(sites, vec!["X", "Y"]);
    }

    #[test]
    fn test_warning_message() {
        let scenario = sample_scenario(100, 1);
        // 130 is above both minimums (X: 40, Y: 20)
        assert!(scan_with_threshold(&scenario, 130).unwrap().is_empty());

        let warnings = scan_with_threshold(&scenario, 20).unwrap();
        assert_eq!(warnings.len(), 2);
        let message = warnings[1].to_string();
        assert!(message.contains("site: Y"));
        assert!(message.contains("less than 20"));
    }
}
