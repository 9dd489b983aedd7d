use crate::{
    error::{Result, SelectError},
    model::{Cost, Weight},
    solution::Solution,
};
use serde::Serialize;
use std::collections::HashSet;

/// One line of the report: a location, its workers and the latency to one
/// selected hosting site
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub demand: String,
    pub weight: Weight,
    pub cost: Cost,
    pub site: String,
}

/// Flattens a solution into report rows, grouped by selected site.
pub fn extract(solution: &Solution) -> Result<Vec<ReportRow>> {
    let selection = solution.selection();
    if selection.is_empty() {
        return Err(SelectError::MalformedSolution(
            "solution has no selected sites".to_string(),
        ));
    }

    let mut per_site: Vec<HashSet<&str>> = vec![HashSet::new(); selection.len()];
    let mut rows = Vec::with_capacity(solution.assignments().len());

    for a in solution.assignments() {
        let pos = selection
            .iter()
            .position(|s| s == a.site)
            .ok_or_else(|| {
                SelectError::MalformedSolution(format!(
                    "assignment to '{}' which is not selected",
                    a.site
                ))
            })?;
        if !per_site[pos].insert(a.demand.as_str()) {
            return Err(SelectError::MalformedSolution(format!(
                "'{}' is assigned to '{}' twice",
                a.demand, a.site
            )));
        }
        rows.push(ReportRow {
            demand: a.demand.clone(),
            weight: a.weight,
            cost: a.cost,
            site: a.site.clone(),
        });
    }

    // every selected site must see the same, non-empty set of demand points
    let first = &per_site[0];
    if first.is_empty() || per_site.iter().any(|s| s != first) {
        return Err(SelectError::MalformedSolution(
            "assignments do not cover every demand point for every selected site".to_string(),
        ));
    }

    rows.sort_by_key(|r| {
        selection
            .iter()
            .position(|s| s == r.site)
            .unwrap_or(usize::MAX)
    });
    Ok(rows)
}
