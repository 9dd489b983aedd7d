use crate::{
    builder::Instance,
    error::{Result, SelectError},
    model::{Cost, DemandIdx, SiteIdx},
};

/// What a single site brings to any selection containing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    pub site: SiteIdx,
    pub name: String,
    /// All cap constraints of this site hold when it is selected
    pub feasible: bool,
    /// Σ_d weight(d) · cost(d, s)
    pub contribution: u64,
    /// Demand point with the highest cost to this site
    pub worst: Option<(DemandIdx, Cost)>,
}

/// One profile per selection variable, in catalog order.
///
/// Feasibility of a site does not depend on the other selected sites, so
/// infeasible sites can be dropped before any search.
pub(crate) fn profile_sites(instance: &Instance<'_>) -> Result<Vec<SiteProfile>> {
    let mut profiles: Vec<SiteProfile> = instance
        .variables()
        .iter()
        .map(|v| SiteProfile {
            site: v.site,
            name: v.name.clone(),
            feasible: true,
            contribution: 0,
            worst: None,
        })
        .collect();

    for c in instance.cap_constraints() {
        let profile = &mut profiles[c.site.0];
        profile.feasible &= c.holds_when_selected();
        if profile.worst.is_none_or(|(_, cost)| c.cost > cost) {
            profile.worst = Some((c.demand, c.cost));
        }
    }

    for term in instance.objective() {
        let profile = &mut profiles[term.site.0];
        profile.contribution = profile
            .contribution
            .checked_add(term.coefficient)
            .ok_or_else(|| SelectError::ObjectiveOverflow {
                site: profile.name.clone(),
            })?;
    }

    for p in &profiles {
        log::debug!(
            "site {:<24} feasible={} contribution={}",
            p.name,
            p.feasible,
            p.contribution
        );
    }

    Ok(profiles)
}
