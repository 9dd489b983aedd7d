use crate::{
    error::{Result, SelectError},
    model::{Cost, DemandIdx, Scenario, SiteIdx},
};

/// Boolean decision variable x_s: site `site` is selected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionVar {
    pub site: SiteIdx,
    pub name: String,
}

/// Σ x_s = rhs over `vars`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardinalityConstraint {
    pub vars: Vec<SiteIdx>,
    pub rhs: usize,
}

/// cost(d, s) · x_s <= cap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapConstraint {
    pub demand: DemandIdx,
    pub site: SiteIdx,
    pub cost: Cost,
    pub cap: Cost,
}

impl CapConstraint {
    /// Whether the constraint still holds once x_s = 1
    pub fn holds_when_selected(&self) -> bool {
        self.cost <= self.cap
    }
}

/// weight(d) · cost(d, s) · x_s
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectiveTerm {
    pub demand: DemandIdx,
    pub site: SiteIdx,
    pub coefficient: u64,
}

/// Optimization instance derived from a [`Scenario`].
///
/// Every selected site is constrained against every demand point and
/// contributes its weighted cost for every demand point to the objective.
#[derive(Debug, Clone)]
pub struct Instance<'a> {
    scenario: &'a Scenario,
    variables: Vec<SelectionVar>,
    cardinality: CardinalityConstraint,
    cap_constraints: Vec<CapConstraint>,
    objective: Vec<ObjectiveTerm>,
}

/// Translates a scenario into selection variables, constraints and objective
pub fn build(scenario: &Scenario) -> Result<Instance<'_>> {
    scenario.validate()?;

    let variables: Vec<SelectionVar> = scenario
        .site_indices()
        .map(|site| SelectionVar {
            site,
            name: scenario.site(site).name().to_string(),
        })
        .collect();

    let cardinality = CardinalityConstraint {
        vars: variables.iter().map(|v| v.site).collect(),
        rhs: scenario.k(),
    };

    let pairs = scenario.demands().len() * scenario.sites().len();
    let mut cap_constraints = Vec::with_capacity(pairs);
    let mut objective = Vec::with_capacity(pairs);

    for demand in scenario.demand_indices() {
        let weight = scenario.demand(demand).weight();
        for site in scenario.site_indices() {
            let cost = scenario.cost(demand, site)?;
            cap_constraints.push(CapConstraint {
                demand,
                site,
                cost,
                cap: scenario.cap(),
            });

            let coefficient =
                weight
                    .checked_mul(cost)
                    .ok_or_else(|| SelectError::ObjectiveOverflow {
                        site: scenario.site(site).name().to_string(),
                    })?;
            objective.push(ObjectiveTerm {
                demand,
                site,
                coefficient,
            });
        }
    }

    log::debug!(
        "model built: {} variables, {} cap constraints, {} objective terms",
        variables.len(),
        cap_constraints.len(),
        objective.len()
    );

    Ok(Instance {
        scenario,
        variables,
        cardinality,
        cap_constraints,
        objective,
    })
}

impl<'a> Instance<'a> {
    pub fn scenario(&self) -> &'a Scenario {
        self.scenario
    }

    pub fn variables(&self) -> &[SelectionVar] {
        &self.variables
    }

    pub fn cardinality(&self) -> &CardinalityConstraint {
        &self.cardinality
    }

    pub fn cap_constraints(&self) -> &[CapConstraint] {
        &self.cap_constraints
    }

    pub fn objective(&self) -> &[ObjectiveTerm] {
        &self.objective
    }

    /// Whether `selected` satisfies the cardinality and every cap constraint
    pub fn is_feasible(&self, selected: &[SiteIdx]) -> bool {
        if selected.len() != self.cardinality.rhs {
            return false;
        }
        self.cap_constraints
            .iter()
            .filter(|c| selected.contains(&c.site))
            .all(CapConstraint::holds_when_selected)
    }

    /// Objective value of a selection
    pub fn evaluate(&self, selected: &[SiteIdx]) -> Result<u64> {
        self.objective
            .iter()
            .filter(|t| selected.contains(&t.site))
            .try_fold(0u64, |acc, t| {
                acc.checked_add(t.coefficient)
                    .ok_or_else(|| SelectError::ObjectiveOverflow {
                        site: self.scenario.site(t.site).name().to_string(),
                    })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sample_scenario;

    #[test]
    fn test_instance_shape() {
        let scenario = sample_scenario(100, 1);
        let instance = build(&scenario).unwrap();

        assert_eq!(instance.variables().len(), 2);
        assert_eq!(instance.variables()[1].name, "Y");
        assert_eq!(instance.cardinality().rhs, 1);
        assert_eq!(instance.cardinality().vars, vec![SiteIdx(0), SiteIdx(1)]);
        assert_eq!(instance.cap_constraints().len(), 6);
        assert_eq!(instance.objective().len(), 6);
        assert!(instance.cap_constraints().iter().all(|c| c.cap == 100));
    }

    #[test]
    fn test_objective_coefficients() {
        let scenario = sample_scenario(100, 1);
        let instance = build(&scenario).unwrap();

        // B (weight 20) -> Y (30)
        let term = instance
            .objective()
            .iter()
            .find(|t| t.demand == DemandIdx(1) && t.site == SiteIdx(1))
            .unwrap();
        assert_eq!(term.coefficient, 600);
    }

    #[test]
    fn test_evaluate_sums_over_selected_sites() {
        let scenario = sample_scenario(100, 2);
        let instance = build(&scenario).unwrap();

        // X: 10*50 + 20*40 + 5*60, Y: 10*90 + 20*30 + 5*20
        assert_eq!(instance.evaluate(&[SiteIdx(0)]).unwrap(), 1600);
        assert_eq!(instance.evaluate(&[SiteIdx(1)]).unwrap(), 1600);
        assert_eq!(instance.evaluate(&[SiteIdx(0), SiteIdx(1)]).unwrap(), 3200);
    }

    #[test]
    fn test_feasibility_check() {
        let scenario = sample_scenario(55, 1);
        let instance = build(&scenario).unwrap();

        // X has C -> X = 60 > 55, Y has A -> Y = 90 > 55
        assert!(!instance.is_feasible(&[SiteIdx(0)]));
        assert!(!instance.is_feasible(&[SiteIdx(1)]));
        // wrong cardinality
        assert!(!instance.is_feasible(&[]));

        let scenario = sample_scenario(100, 1);
        let instance = build(&scenario).unwrap();
        assert!(instance.is_feasible(&[SiteIdx(0)]));
        assert!(!instance.is_feasible(&[SiteIdx(0), SiteIdx(1)]));
    }

    #[test]
    fn test_coefficient_overflow() {
        use crate::model::{CandidateSite, CostMatrix, DemandPoint, Settings};

        let mut matrix = CostMatrix::new();
        matrix.insert("A", "X", 2);
        let settings = Settings {
            cap: u64::MAX,
            k: 1,
            quality_threshold: None,
        };
        let scenario = Scenario::new(
            vec![CandidateSite::new("X")],
            vec![DemandPoint::new("A", u64::MAX)],
            &matrix,
            settings,
        )
        .unwrap();

        assert!(matches!(
            build(&scenario),
            Err(SelectError::ObjectiveOverflow { .. })
        ));
    }
}
