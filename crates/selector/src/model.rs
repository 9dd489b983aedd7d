use crate::{
    constants::{DEFAULT_CAP, DEFAULT_K, DEFAULT_QUALITY_THRESHOLD},
    error::{Result, SelectError},
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    fmt,
};

/// Latency in milliseconds
pub type Cost = u64;
/// Number of workers at a location
pub type Weight = u64;

/// Position of a site in the scenario catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SiteIdx(pub usize);

/// Position of a demand point in the scenario catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DemandIdx(pub usize);

/// A place that can host the service (e.g. a cloud region)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CandidateSite {
    name: String,
}

impl CandidateSite {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for CandidateSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A location with workers that need access to the service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DemandPoint {
    name: String,
    weight: Weight,
}

impl DemandPoint {
    pub fn new(name: impl Into<String>, weight: Weight) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }
}

/// Sparse (demand, site) -> cost table as handed over by a loader.
///
/// Completeness is only checked when a [`Scenario`] is built from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CostMatrix {
    entries: HashMap<(String, String), Cost>,
}

impl CostMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a cost, returning the previous one for this pair if any
    pub fn insert(
        &mut self,
        demand: impl Into<String>,
        site: impl Into<String>,
        cost: Cost,
    ) -> Option<Cost> {
        self.entries.insert((demand.into(), site.into()), cost)
    }

    pub fn remove(&mut self, demand: &str, site: &str) -> Option<Cost> {
        self.entries.remove(&(demand.to_string(), site.to_string()))
    }

    pub fn get(&self, demand: &str, site: &str) -> Option<Cost> {
        // HashMap<(String, String), _> cannot be queried with borrowed tuples
        self.entries
            .get(&(demand.to_string(), site.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Solve parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Maximum latency a selected site may have to any location
    pub cap: Cost,
    /// Exact number of sites to select
    pub k: usize,
    /// Only used for the connectivity scan
    pub quality_threshold: Option<Cost>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cap: DEFAULT_CAP,
            k: DEFAULT_K,
            quality_threshold: Some(DEFAULT_QUALITY_THRESHOLD),
        }
    }
}

/// Validated, read-only view over sites, demand points, costs and settings.
///
/// Costs are stored densely, row-major by demand point. A `Scenario` can only
/// be obtained through [`Scenario::new`], so every instance has passed
/// validation and covers every (demand, site) pair.
#[derive(Debug, Clone)]
pub struct Scenario {
    sites: Vec<CandidateSite>,
    demands: Vec<DemandPoint>,
    costs: Vec<Cost>,
    settings: Settings,
}

impl Scenario {
    pub fn new(
        sites: Vec<CandidateSite>,
        demands: Vec<DemandPoint>,
        matrix: &CostMatrix,
        settings: Settings,
    ) -> Result<Self> {
        validate_catalog(&sites, &demands, &settings)?;

        let mut costs = Vec::with_capacity(sites.len() * demands.len());
        for demand in &demands {
            for site in &sites {
                let cost = matrix.get(demand.name(), site.name()).ok_or_else(|| {
                    SelectError::MissingCostEntry {
                        demand: demand.name().to_string(),
                        site: site.name().to_string(),
                    }
                })?;
                costs.push(cost);
            }
        }

        let used = costs.len();
        if matrix.len() > used {
            log::debug!(
                "cost matrix has {} entries outside the catalog, ignored",
                matrix.len() - used
            );
        }

        Ok(Self {
            sites,
            demands,
            costs,
            settings,
        })
    }

    /// Re-checks the catalog and settings invariants
    pub fn validate(&self) -> Result<()> {
        validate_catalog(&self.sites, &self.demands, &self.settings)?;
        if self.costs.len() != self.sites.len() * self.demands.len() {
            return Err(SelectError::InvalidConfiguration(format!(
                "cost table has {} entries, expected {}",
                self.costs.len(),
                self.sites.len() * self.demands.len()
            )));
        }
        Ok(())
    }

    pub fn sites(&self) -> &[CandidateSite] {
        &self.sites
    }

    pub fn demands(&self) -> &[DemandPoint] {
        &self.demands
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cap(&self) -> Cost {
        self.settings.cap
    }

    pub fn k(&self) -> usize {
        self.settings.k
    }

    pub fn quality_threshold(&self) -> Option<Cost> {
        self.settings.quality_threshold
    }

    pub fn site(&self, idx: SiteIdx) -> &CandidateSite {
        &self.sites[idx.0]
    }

    pub fn demand(&self, idx: DemandIdx) -> &DemandPoint {
        &self.demands[idx.0]
    }

    pub fn site_indices(&self) -> impl Iterator<Item = SiteIdx> + '_ {
        (0..self.sites.len()).map(SiteIdx)
    }

    pub fn demand_indices(&self) -> impl Iterator<Item = DemandIdx> + '_ {
        (0..self.demands.len()).map(DemandIdx)
    }

    pub fn site_index(&self, name: &str) -> Option<SiteIdx> {
        self.sites.iter().position(|s| s.name() == name).map(SiteIdx)
    }

    pub fn demand_index(&self, name: &str) -> Option<DemandIdx> {
        self.demands
            .iter()
            .position(|d| d.name() == name)
            .map(DemandIdx)
    }

    /// Cost between a demand point and a site
    pub fn cost(&self, demand: DemandIdx, site: SiteIdx) -> Result<Cost> {
        if demand.0 < self.demands.len() && site.0 < self.sites.len() {
            if let Some(&cost) = self.costs.get(demand.0 * self.sites.len() + site.0) {
                return Ok(cost);
            }
        }
        Err(SelectError::MissingCostEntry {
            demand: self
                .demands
                .get(demand.0)
                .map_or_else(|| format!("#{}", demand.0), |d| d.name().to_string()),
            site: self
                .sites
                .get(site.0)
                .map_or_else(|| format!("#{}", site.0), |s| s.name().to_string()),
        })
    }

    pub fn cost_by_name(&self, demand: &str, site: &str) -> Result<Cost> {
        match (self.demand_index(demand), self.site_index(site)) {
            (Some(d), Some(s)) => self.cost(d, s),
            _ => Err(SelectError::MissingCostEntry {
                demand: demand.to_string(),
                site: site.to_string(),
            }),
        }
    }
}

fn validate_catalog(
    sites: &[CandidateSite],
    demands: &[DemandPoint],
    settings: &Settings,
) -> Result<()> {
    if settings.cap == 0 {
        return Err(SelectError::InvalidConfiguration(
            "cap must be greater than 0".to_string(),
        ));
    }
    if settings.k == 0 {
        return Err(SelectError::InvalidConfiguration(
            "k must be at least 1".to_string(),
        ));
    }
    if sites.is_empty() {
        return Err(SelectError::InvalidConfiguration(
            "no candidate sites given".to_string(),
        ));
    }
    if demands.is_empty() {
        return Err(SelectError::InvalidConfiguration(
            "no demand points given".to_string(),
        ));
    }
    if settings.k > sites.len() {
        return Err(SelectError::InvalidConfiguration(format!(
            "k = {} exceeds the {} candidate sites",
            settings.k,
            sites.len()
        )));
    }

    let mut seen = HashSet::with_capacity(sites.len());
    for site in sites {
        if !seen.insert(site.name()) {
            return Err(SelectError::InvalidConfiguration(format!(
                "duplicate candidate site '{}'",
                site.name()
            )));
        }
    }

    let mut seen = HashSet::with_capacity(demands.len());
    for demand in demands {
        if demand.weight() == 0 {
            return Err(SelectError::InvalidConfiguration(format!(
                "demand point '{}' must have a positive weight",
                demand.name()
            )));
        }
        if !seen.insert(demand.name()) {
            return Err(SelectError::InvalidConfiguration(format!(
                "duplicate demand point '{}'",
                demand.name()
            )));
        }
    }

    Ok(())
}

/// Two-site, three-location scenario shared by unit tests
#[cfg(test)]
pub(crate) fn sample_scenario(cap: Cost, k: usize) -> Scenario {
    scenario_with_c_to_x(cap, k, 60)
}

/// Same as `sample_scenario` but C -> X costs 70, so X totals 1650 and Y wins
/// outright with 1600
#[cfg(test)]
pub(crate) fn skewed_scenario(cap: Cost, k: usize) -> Scenario {
    scenario_with_c_to_x(cap, k, 70)
}

#[cfg(test)]
fn scenario_with_c_to_x(cap: Cost, k: usize, c_to_x: Cost) -> Scenario {
    let sites = vec![CandidateSite::new("X"), CandidateSite::new("Y")];
    let demands = vec![
        DemandPoint::new("A", 10),
        DemandPoint::new("B", 20),
        DemandPoint::new("C", 5),
    ];
    let mut matrix = CostMatrix::new();
    for (d, s, c) in [
        ("A", "X", 50),
        ("A", "Y", 90),
        ("B", "X", 40),
        ("B", "Y", 30),
        ("C", "X", c_to_x),
        ("C", "Y", 20),
    ] {
        matrix.insert(d, s, c);
    }
    let settings = Settings {
        cap,
        k,
        quality_threshold: None,
    };
    Scenario::new(sites, demands, &matrix, settings).unwrap()
}
