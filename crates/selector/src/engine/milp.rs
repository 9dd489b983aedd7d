use crate::{
    builder::Instance,
    error::{Result, SelectError},
    model::SiteIdx,
};
use good_lp::{Expression, ProblemVariables, Solution, SolverModel, Variable, microlp, variable};

/// Threshold above which a binary variable counts as selected
const SOLUTION_THRESHOLD: f64 = 0.5;

/// Solves the instance as a 0-1 program and returns the selected sites.
///
/// Ties are left to the backend; the caller canonicalizes them.
pub(crate) fn solve_milp(instance: &Instance<'_>) -> Result<Vec<SiteIdx>> {
    let mut vars = ProblemVariables::new();

    // x_s (binary)
    let x: Vec<Variable> = instance
        .variables()
        .iter()
        .map(|_| vars.add(variable().binary()))
        .collect();

    // min Σ_{d,s} w_d · c_{d,s} · x_s
    let mut objective = Expression::from(0.0);
    for term in instance.objective() {
        objective += term.coefficient as f64 * x[term.site.0];
    }

    let mut model = vars.minimise(objective).using(microlp);

    // Σ_s x_s = K
    let cardinality = instance.cardinality();
    let sum: Expression = cardinality.vars.iter().map(|s| x[s.0]).sum();
    model = model.with(sum.eq(cardinality.rhs as f64));

    // c_{d,s} · x_s <= cap
    for c in instance.cap_constraints() {
        model = model.with((c.cost as f64 * x[c.site.0]) << c.cap as f64);
    }

    log::info!(
        "solving 0-1 model: {} variables, {} constraints",
        x.len(),
        instance.cap_constraints().len() + 1
    );
    let solution = model
        .solve()
        .map_err(|e| SelectError::Solver(format!("failed to solve: {}", e)))?;

    Ok(instance
        .variables()
        .iter()
        .filter(|v| solution.value(x[v.site.0]) > SOLUTION_THRESHOLD)
        .map(|v| v.site)
        .collect())
}
