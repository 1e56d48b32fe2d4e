//! Resilience evaluation: the extra operating cost a fixed plan incurs
//! under each contingency event.

use gridplan_core::DecompositionConfig;
use gridplan_solver::{LpBackend, SearchStrategy};
use tracing::{debug, info, warn};

use super::cut::CapacityLinks;
use super::outcome::ResilienceReport;
use crate::error::EngineResult;
use crate::model::PlanModels;

/// Evaluate every event against the plan's `capacities`.
///
/// `base_costs[y - 1]` holds the base-case operating cost of year `y` when
/// it is already known; missing ones are solved here for the years any
/// event strikes.
pub fn evaluate<B: LpBackend>(
    backend: &mut B,
    models: &mut PlanModels,
    links: &CapacityLinks,
    capacities: &[f64],
    base_costs: &[Option<f64>],
    settings: &DecompositionConfig,
) -> EngineResult<ResilienceReport> {
    let years = models.years();
    let events = models.events.event_count();

    let mut base = vec![0.0; years as usize];
    let mut pushed = false;
    for year in 1..=years {
        if !models.events.needs_base(year) {
            continue;
        }
        let known = base_costs.get(year as usize - 1).copied().flatten();
        let cost = match known {
            Some(cost) => cost,
            None => {
                if !pushed {
                    links.push(&mut models.subproblems, capacities, &models.events, 0)?;
                    pushed = true;
                }
                let solution = backend.solve(&models.subproblems[year as usize - 1], SearchStrategy::Dual)?;
                if !solution.is_optimal() {
                    warn!(year, status = %solution.status, "Base case of the plan is not operable");
                    return Ok(ResilienceReport {
                        event_costs: vec![settings.event_penalty; events],
                        value: settings.resilience_penalty,
                        feasible: false,
                    });
                }
                solution.objective
            }
        };
        base[year as usize - 1] = cost;
    }

    let mut event_costs = Vec::with_capacity(events);
    let mut feasible = true;
    for event in 1..=events {
        let mut cost: f64 = (1..=years)
            .filter(|&y| models.events.affects(y, event))
            .map(|y| -base[y as usize - 1])
            .sum();
        links.push(&mut models.subproblems, capacities, &models.events, event)?;

        for year in (1..=years).filter(|&y| models.events.affects(y, event)) {
            let solution = backend.solve(&models.subproblems[year as usize - 1], SearchStrategy::Dual)?;
            if !solution.is_optimal() {
                debug!(event, year, status = %solution.status, "Event leaves the plan inoperable");
                cost = settings.event_penalty;
                feasible = false;
                break;
            }
            cost += solution.objective;
        }
        debug!(event, name = %models.events.names[event - 1], cost, "Evaluated event");
        event_costs.push(cost);
    }

    let value = if feasible {
        event_costs.iter().sum::<f64>() / events.max(1) as f64
    } else {
        settings.resilience_penalty
    };
    info!(events, value, feasible, "Resilience evaluated");
    Ok(ResilienceReport {
        event_costs,
        value,
        feasible,
    })
}
