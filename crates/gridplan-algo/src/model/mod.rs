//! Planning models: the monolithic system, the Benders master, one
//! operating subproblem per year, and the data needed to read their
//! solutions back.
//!
//! On disk a model set is a directory:
//!
//! ```text
//! plan.mps            monolithic model
//! bend_0.mps          master
//! bend_<n>.mps        subproblem of year n
//! idx_<family>.csv    solution index per variable family
//! bend_events.json    capacity multipliers and event years
//! ```

mod builder;
mod events;

pub use builder::ModelBuilder;
pub use events::{EventTable, YearEvents};

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use gridplan_solver::{read_mps, write_mps, ConstraintSystem};
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::index::{IndexRegistry, VariableFamily};

const PLAN_FILE: &str = "plan.mps";
const EVENTS_FILE: &str = "bend_events.json";

fn subproblem_file(model: usize) -> String {
    format!("bend_{}.mps", model)
}

#[derive(Debug, Clone)]
pub struct PlanModels {
    pub plan: ConstraintSystem,
    pub master: ConstraintSystem,
    /// Year `n` is at index `n - 1`.
    pub subproblems: Vec<ConstraintSystem>,
    pub registry: IndexRegistry,
    pub events: EventTable,
}

impl PlanModels {
    pub fn years(&self) -> u32 {
        self.subproblems.len() as u32
    }

    pub fn subproblem(&self, year: u32) -> Option<&ConstraintSystem> {
        year.checked_sub(1)
            .and_then(|y| self.subproblems.get(y as usize))
    }

    /// Check that registry, event table and systems describe the same model.
    pub fn validate(&self) -> EngineResult<()> {
        let years = self.years();
        let capacities = self.registry.get(VariableFamily::Capacity).len();
        self.events.validate(capacities, years)?;
        if self.plan.num_columns() != self.registry.total() {
            return Err(EngineError::Inconsistent(format!(
                "plan has {} columns, registry lists {}",
                self.plan.num_columns(),
                self.registry.total()
            )));
        }
        for family in VariableFamily::ALL {
            if let Some(bad) = self.registry.get(family).iter().find(|e| e.year == 0 || e.year > years) {
                return Err(EngineError::Inconsistent(format!(
                    "{} lies in year {} outside 1..={}",
                    bad.name, bad.year, years
                )));
            }
        }
        Ok(())
    }

    pub fn save_dir(&self, dir: &Path) -> EngineResult<()> {
        std::fs::create_dir_all(dir)?;
        write_system(&self.plan, &dir.join(PLAN_FILE))?;
        write_system(&self.master, &dir.join(subproblem_file(0)))?;
        for (i, system) in self.subproblems.iter().enumerate() {
            write_system(system, &dir.join(subproblem_file(i + 1)))?;
        }
        self.registry.save_dir(dir)?;
        let mut events = BufWriter::new(File::create(dir.join(EVENTS_FILE))?);
        serde_json::to_writer_pretty(&mut events, &self.events)?;
        events.flush()?;
        info!(dir = %dir.display(), years = self.years(), "Saved planning models");
        Ok(())
    }

    /// Load a model set written by [`PlanModels::save_dir`] for a horizon of
    /// `years` years.
    pub fn load_dir(dir: &Path, years: u32) -> EngineResult<Self> {
        let plan = read_system(&dir.join(PLAN_FILE))?;
        let master = read_system(&dir.join(subproblem_file(0)))?;
        let subproblems = (1..=years as usize)
            .map(|n| read_system(&dir.join(subproblem_file(n))))
            .collect::<EngineResult<Vec<_>>>()?;
        let registry = IndexRegistry::load_dir(dir)?;
        let events: EventTable =
            serde_json::from_reader(BufReader::new(File::open(dir.join(EVENTS_FILE))?))?;

        let models = Self {
            plan,
            master,
            subproblems,
            registry,
            events,
        };
        models.validate()?;
        info!(dir = %dir.display(), years, "Loaded planning models");
        Ok(models)
    }
}

fn write_system(system: &ConstraintSystem, path: &Path) -> EngineResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    write_mps(system, &mut out)?;
    out.flush()?;
    Ok(())
}

fn read_system(path: &Path) -> EngineResult<ConstraintSystem> {
    let file = File::open(path).map_err(|e| {
        EngineError::Inconsistent(format!("cannot open {}: {}", path.display(), e))
    })?;
    Ok(read_mps(BufReader::new(file))?)
}
