//! The decomposition engine.

use gridplan_core::{DecompositionConfig, PlanConfig, RowSense};
use gridplan_solver::{ConstraintSystem, LpBackend, LpSolution, SearchStrategy};
use tracing::{debug, info, warn};
use web_time::Instant;

use super::cut::{needs_optimality_cut, CapacityLinks, Cut, CutKind};
use super::outcome::{PlanSolution, Termination};
use super::resilience;
use crate::error::{EngineError, EngineResult};
use crate::index::{IndexRegistry, Placement, VariableFamily};
use crate::model::PlanModels;
use crate::report::emission_index;

/// Metric names whose yearly totals feed the emission index.
const EMISSION_METRICS: [&str; 2] = ["CO2", "EmCO2"];

/// Plan values of a finished solve before goals are computed.
struct Stage {
    termination: Termination,
    iterations: usize,
    optimality_cuts: usize,
    feasibility_cuts: usize,
    cost: f64,
    values: Vec<f64>,
    /// Operating cost per year when the subproblems were solved.
    base_costs: Vec<Option<f64>>,
}

/// Solves a set of planning models with a linear backend, either through
/// Benders decomposition or as one monolithic problem.
///
/// Every session leaves the models as it found them: link rows, cuts and
/// investment floors are removed when it ends.
pub struct DecompositionEngine<B> {
    backend: B,
    models: PlanModels,
    settings: DecompositionConfig,
    use_benders: bool,
    metrics: Vec<String>,
    /// Index 0 is the master (or monolithic) problem, then one per year.
    strategies: Vec<SearchStrategy>,
}

impl<B: LpBackend> DecompositionEngine<B> {
    pub fn new(backend: B, models: PlanModels, config: &PlanConfig) -> EngineResult<Self> {
        models.validate()?;
        config.decomposition.validate()?;
        let strategies = vec![SearchStrategy::default(); models.subproblems.len() + 1];
        Ok(Self {
            backend,
            models,
            settings: config.decomposition.clone(),
            use_benders: config.use_benders,
            metrics: config.metrics.clone(),
            strategies,
        })
    }

    pub fn models(&self) -> &PlanModels {
        &self.models
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_models(self) -> PlanModels {
        self.models
    }

    pub fn solve(&mut self) -> EngineResult<PlanSolution> {
        self.run_session()
    }

    /// Solve with every investment at least `minimum[i]`, one value per
    /// investment entry.
    pub fn solve_with_min_investment(&mut self, minimum: &[f64]) -> EngineResult<PlanSolution> {
        let investments = self.models.registry.get(VariableFamily::Investment);
        if minimum.len() != investments.len() {
            return Err(EngineError::Inconsistent(format!(
                "{} minimum investments given, model has {}",
                minimum.len(),
                investments.len()
            )));
        }
        let names: Vec<String> = investments.iter().map(|e| e.name.clone()).collect();

        let target = if self.use_benders {
            &mut self.models.master
        } else {
            &mut self.models.plan
        };
        let rows = target.num_rows();
        let added = add_investment_floors(target, &names, minimum);
        let result = added.and_then(|_| self.run_session());

        let target = if self.use_benders {
            &mut self.models.master
        } else {
            &mut self.models.plan
        };
        target.truncate_rows(rows);
        result
    }

    fn run_session(&mut self) -> EngineResult<PlanSolution> {
        let start = Instant::now();
        let master_rows = self.models.master.num_rows();
        let sub_rows: Vec<usize> = self.models.subproblems.iter().map(|s| s.num_rows()).collect();

        let result = CapacityLinks::install(&mut self.models).and_then(|links| self.session(&links));

        self.models.master.truncate_rows(master_rows);
        for (sub, rows) in self.models.subproblems.iter_mut().zip(sub_rows) {
            sub.truncate_rows(rows);
        }
        self.strategies.fill(SearchStrategy::default());

        let mut solution = result?;
        solution.solve_time_ms = start.elapsed().as_millis();
        info!(
            termination = %solution.termination,
            iterations = solution.iterations,
            cost = solution.cost,
            time_ms = solution.solve_time_ms,
            "Planning session finished"
        );
        Ok(solution)
    }

    fn session(&mut self, links: &CapacityLinks) -> EngineResult<PlanSolution> {
        let stage = if self.use_benders {
            self.decompose(links)?
        } else {
            self.monolithic()?
        };
        if stage.termination == Termination::Infeasible {
            let mut solution = PlanSolution::infeasible(
                &self.settings,
                self.metrics.len(),
                self.models.events.event_count() > 0,
                stage.iterations,
            );
            solution.optimality_cuts = stage.optimality_cuts;
            solution.feasibility_cuts = stage.feasibility_cuts;
            return Ok(solution);
        }

        let registry = &self.models.registry;
        let emissions = registry.get(VariableFamily::Emission);
        let metrics = emissions.sum_by_row(&stage.values, registry.start(VariableFamily::Emission));
        let investments = registry
            .get(VariableFamily::Investment)
            .sum_by_row(&stage.values, registry.start(VariableFamily::Investment));
        let emission_index = self.emission_series(&stage.values).and_then(|s| emission_index(&s));

        let resilience = if self.models.events.event_count() > 0 {
            let capacities = self.capacity_values(&stage.values);
            Some(resilience::evaluate(
                &mut self.backend,
                &mut self.models,
                links,
                &capacities,
                &stage.base_costs,
                &self.settings,
            )?)
        } else {
            None
        };

        Ok(PlanSolution {
            termination: stage.termination,
            iterations: stage.iterations,
            optimality_cuts: stage.optimality_cuts,
            feasibility_cuts: stage.feasibility_cuts,
            cost: stage.cost,
            metrics,
            resilience,
            values: stage.values,
            investments,
            emission_index,
            solve_time_ms: 0,
        })
    }

    fn decompose(&mut self, links: &CapacityLinks) -> EngineResult<Stage> {
        let years = self.models.years();
        let mut iterations = 0;
        let mut optimality_cuts = 0;
        let mut feasibility_cuts = 0;
        let mut last: Option<(LpSolution, Vec<LpSolution>)> = None;

        let termination = loop {
            if iterations >= self.settings.max_iterations {
                warn!(iterations, "Iteration limit reached before convergence");
                break Termination::IterationLimit;
            }
            iterations += 1;

            let master = self.backend.solve(&self.models.master, self.strategies[0])?;
            if !master.is_optimal() {
                warn!(iteration = iterations, status = %master.status, "Master problem has no plan");
                return Ok(Stage {
                    termination: Termination::Infeasible,
                    iterations,
                    optimality_cuts,
                    feasibility_cuts,
                    cost: self.settings.infeasible_objective,
                    values: Vec::new(),
                    base_costs: Vec::new(),
                });
            }
            debug!(iteration = iterations, objective = master.objective, "Solved master");

            let capacities = links.master_values(&master.primal);
            links.push(&mut self.models.subproblems, &capacities, &self.models.events, 0)?;

            let mut cuts = Vec::new();
            let mut subs = Vec::with_capacity(years as usize);
            for year in 1..=years {
                let slot = year as usize;
                let system = &self.models.subproblems[slot - 1];
                let mut solution = self.backend.solve(system, self.strategies[slot])?;

                if !solution.is_optimal() {
                    let cut = phase_one_cut(
                        &mut self.backend,
                        system,
                        year,
                        iterations,
                        links,
                        &self.settings,
                    )?;
                    if let Some(cut) = cut {
                        debug!(
                            year,
                            iteration = iterations,
                            status = %solution.status,
                            "Adding feasibility cut"
                        );
                        cuts.push(cut);
                        feasibility_cuts += 1;
                        subs.push(solution);
                        continue;
                    }
                    // The rows can be met, so the first answer was numerical.
                    if self.strategies[slot] != SearchStrategy::Primal {
                        debug!(
                            year,
                            status = %solution.status,
                            "Retrying subproblem with the primal strategy"
                        );
                        self.strategies[slot] = SearchStrategy::Primal;
                        solution = self.backend.solve(system, SearchStrategy::Primal)?;
                    }
                    if !solution.is_optimal() {
                        return Err(EngineError::SubproblemUnsolved {
                            year,
                            status: solution.status,
                        });
                    }
                }

                let estimate = master.primal.get(slot - 1).copied().unwrap_or(0.0);
                if needs_optimality_cut(estimate, solution.objective, &self.settings) {
                    debug!(year, estimate, cost = solution.objective, "Adding optimality cut");
                    cuts.push(Cut::from_duals(
                        CutKind::Optimality,
                        year,
                        iterations,
                        system,
                        &solution,
                        links,
                    ));
                    optimality_cuts += 1;
                }
                subs.push(solution);
            }

            let converged = cuts.is_empty();
            for cut in &cuts {
                cut.apply(&mut self.models.master)?;
            }
            self.strategies.fill(SearchStrategy::default());
            last = Some((master, subs));

            if converged {
                info!(iterations, "No cuts added, plan is optimal");
                break Termination::Converged;
            }
        };

        let (master, subs) = last.ok_or_else(|| {
            EngineError::Inconsistent("decomposition stopped before solving the master".into())
        })?;
        let values = assemble_solution(&self.models.registry, years, &master, &subs);
        let base_costs = subs
            .iter()
            .map(|s| s.is_optimal().then_some(s.objective))
            .collect();
        Ok(Stage {
            termination,
            iterations,
            optimality_cuts,
            feasibility_cuts,
            cost: master.objective,
            values,
            base_costs,
        })
    }

    fn monolithic(&mut self) -> EngineResult<Stage> {
        let solution = self.backend.solve(&self.models.plan, self.strategies[0])?;
        let years = self.models.subproblems.len();
        if !solution.is_optimal() {
            warn!(status = %solution.status, "Monolithic problem has no plan");
            return Ok(Stage {
                termination: Termination::Infeasible,
                iterations: 1,
                optimality_cuts: 0,
                feasibility_cuts: 0,
                cost: self.settings.infeasible_objective,
                values: Vec::new(),
                base_costs: Vec::new(),
            });
        }
        info!(objective = solution.objective, "Solved monolithic problem");
        Ok(Stage {
            termination: Termination::Converged,
            iterations: 1,
            optimality_cuts: 0,
            feasibility_cuts: 0,
            cost: solution.objective,
            values: solution.primal,
            base_costs: vec![None; years],
        })
    }

    fn capacity_values(&self, values: &[f64]) -> Vec<f64> {
        let start = self.models.registry.start(VariableFamily::Capacity);
        let count = self.models.registry.get(VariableFamily::Capacity).len();
        (start..start + count)
            .map(|i| values.get(i).copied().unwrap_or(0.0))
            .collect()
    }

    /// Yearly totals of the first emission metric, if one is configured.
    fn emission_series(&self, values: &[f64]) -> Option<Vec<f64>> {
        let metric = self
            .metrics
            .iter()
            .position(|m| EMISSION_METRICS.contains(&m.as_str()))?;
        let registry = &self.models.registry;
        let start = registry.start(VariableFamily::Emission);
        let series = registry
            .get(VariableFamily::Emission)
            .iter()
            .enumerate()
            .filter(|(_, e)| e.position == metric)
            .map(|(i, _)| values.get(start + i).copied().unwrap_or(0.0))
            .collect();
        Some(series)
    }
}

/// Feasibility cut of `year` from the least total row violation of its
/// subproblem under the pushed capacities; `None` when the rows can be met.
///
/// The link rows stay hard, so the duals of the phase-one optimum give the
/// violation as an affine function of the master's capacities and the cut
/// asks it to be at most zero.
fn phase_one_cut<B: LpBackend>(
    backend: &mut B,
    sub: &ConstraintSystem,
    year: u32,
    iteration: usize,
    links: &CapacityLinks,
    settings: &DecompositionConfig,
) -> EngineResult<Option<Cut>> {
    let elastic = links.elastic(year, sub);
    let solution = backend.solve(&elastic, SearchStrategy::Dual)?;
    if !solution.is_optimal() {
        return Err(EngineError::SubproblemUnsolved {
            year,
            status: solution.status,
        });
    }
    debug!(year, violation = solution.objective, "Measured subproblem violation");
    if solution.objective <= settings.feasibility_tolerance {
        return Ok(None);
    }
    Ok(Some(Cut::from_duals(
        CutKind::Feasibility,
        year,
        iteration,
        &elastic,
        &solution,
        links,
    )))
}

fn add_investment_floors(
    system: &mut ConstraintSystem,
    names: &[String],
    minimum: &[f64],
) -> EngineResult<()> {
    for (i, (name, &floor)) in names.iter().zip(minimum).enumerate() {
        let column = system.column_index(name).ok_or_else(|| {
            EngineError::Inconsistent(format!("{} missing from {}", name, system.name()))
        })?;
        system.add_constraint(format!("mininv{}", i), RowSense::Greater, &[(column, 1.0)], floor)?;
    }
    Ok(())
}

/// Lay master and subproblem values out in the flat family order.
///
/// Capacities live in both the master and their year's subproblem; their
/// value comes from the master while the subproblem cursor skips the copy.
pub fn assemble_solution(
    registry: &IndexRegistry,
    years: u32,
    master: &LpSolution,
    subs: &[LpSolution],
) -> Vec<f64> {
    let mut master_cursor = years as usize;
    let mut sub_cursors = vec![0usize; subs.len()];
    let mut values = Vec::with_capacity(registry.total());

    for family in VariableFamily::ALL {
        for entry in registry.get(family).iter() {
            let year = entry.year as usize;
            let value = match family.placement() {
                Placement::Master => {
                    let value = master.primal.get(master_cursor).copied().unwrap_or(f64::NAN);
                    master_cursor += 1;
                    if family == VariableFamily::Capacity {
                        if let Some(cursor) = year.checked_sub(1).and_then(|y| sub_cursors.get_mut(y)) {
                            *cursor += 1;
                        }
                    }
                    value
                }
                Placement::Subproblem => match year.checked_sub(1).and_then(|y| subs.get(y).map(|s| (y, s))) {
                    Some((y, sub)) => {
                        let value = sub.primal.get(sub_cursors[y]).copied().unwrap_or(f64::NAN);
                        sub_cursors[y] += 1;
                        value
                    }
                    None => f64::NAN,
                },
            };
            values.push(value);
        }
    }
    values
}
