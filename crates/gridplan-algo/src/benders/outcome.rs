//! Session outcomes.

use std::fmt;

use gridplan_core::DecompositionConfig;
use serde::{Deserialize, Serialize};

/// How a planning session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// No cut was generated in the last iteration.
    Converged,
    /// The iteration cap was reached; values come from the last iteration.
    IterationLimit,
    /// The master (or monolithic) problem has no feasible plan.
    Infeasible,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::Converged => write!(f, "converged"),
            Termination::IterationLimit => write!(f, "iteration_limit"),
            Termination::Infeasible => write!(f, "infeasible"),
        }
    }
}

/// Cost of operating the plan under each contingency event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResilienceReport {
    /// Extra operating cost per event over the base case, or the event
    /// penalty when operation became infeasible.
    pub event_costs: Vec<f64>,
    /// Mean event cost, or the resilience penalty when any event failed.
    pub value: f64,
    pub feasible: bool,
}

/// Result of one planning session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSolution {
    pub termination: Termination,
    pub iterations: usize,
    pub optimality_cuts: usize,
    pub feasibility_cuts: usize,
    /// Total investment plus operating cost.
    pub cost: f64,
    /// Horizon total of each configured metric.
    pub metrics: Vec<f64>,
    pub resilience: Option<ResilienceReport>,
    /// Flat solution vector in variable family order.
    pub values: Vec<f64>,
    /// Total investment per asset over the horizon.
    pub investments: Vec<f64>,
    pub emission_index: Option<f64>,
    pub solve_time_ms: u128,
}

impl PlanSolution {
    /// Outcome of a session whose plan problem is infeasible: every
    /// objective carries the sentinel.
    pub fn infeasible(
        settings: &DecompositionConfig,
        metrics: usize,
        with_events: bool,
        iterations: usize,
    ) -> Self {
        let sentinel = settings.infeasible_objective;
        Self {
            termination: Termination::Infeasible,
            iterations,
            optimality_cuts: 0,
            feasibility_cuts: 0,
            cost: sentinel,
            metrics: vec![sentinel; metrics],
            resilience: with_events.then(|| ResilienceReport {
                event_costs: Vec::new(),
                value: sentinel,
                feasible: false,
            }),
            values: Vec::new(),
            investments: Vec::new(),
            emission_index: None,
            solve_time_ms: 0,
        }
    }

    pub fn is_converged(&self) -> bool {
        self.termination == Termination::Converged
    }

    /// Objective vector: cost, then one total per metric, then the
    /// resilience metric when events are configured.
    pub fn objectives(&self) -> Vec<f64> {
        let mut objectives = Vec::with_capacity(self.metrics.len() + 2);
        objectives.push(self.cost);
        objectives.extend_from_slice(&self.metrics);
        if let Some(resilience) = &self.resilience {
            objectives.push(resilience.value);
        }
        objectives
    }
}
