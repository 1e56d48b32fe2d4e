//! Assembly of arcs and nodes into the monolithic, master and yearly
//! subproblem constraint systems.
//!
//! Variables are declared family by family in flat solution order, so each
//! system's columns are an order-preserving subsequence of the flat vector.
//! The master additionally starts with one operating-cost estimate per year.
//!
//! ```text
//!   master   : opcostY1..opcostYn | cap | inv | margins | ramp headroom
//!   sub_y<n> : cap copies of year n | Em | flow | UD | reserves | angles
//!   plan     : every family, full capacity columns, no estimates
//! ```

use gridplan_core::{
    Arc, BoundEntry, BoundKind, CapacityPart, Entry, MarginKind, ModelContext, Network, Node,
    ReserveService, ResponseSpeed, RhsEntry, RowDecl, RowSense, OBJECTIVE_ROW,
};
use gridplan_solver::ConstraintSystem;
use tracing::{debug, info};

use super::events::EventTable;
use super::PlanModels;
use crate::error::{EngineError, EngineResult};
use crate::index::{IndexRegistry, VariableFamily};

/// System a row or variable is placed in besides the monolithic plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Home {
    Master,
    Year(u32),
}

struct Assembly {
    plan: ConstraintSystem,
    master: ConstraintSystem,
    subproblems: Vec<ConstraintSystem>,
    registry: IndexRegistry,
}

impl Assembly {
    fn new(years: u32) -> Self {
        Self {
            plan: ConstraintSystem::new("plan"),
            master: ConstraintSystem::new("master"),
            subproblems: (1..=years)
                .map(|y| ConstraintSystem::new(format!("sub_y{}", y)))
                .collect(),
            registry: IndexRegistry::new(),
        }
    }

    fn home(&mut self, home: Home) -> EngineResult<&mut ConstraintSystem> {
        match home {
            Home::Master => Ok(&mut self.master),
            Home::Year(year) => {
                let count = self.subproblems.len();
                year.checked_sub(1)
                    .and_then(|y| self.subproblems.get_mut(y as usize))
                    .ok_or_else(|| {
                        EngineError::Inconsistent(format!(
                            "year {} outside the {} subproblems",
                            year, count
                        ))
                    })
            }
        }
    }

    fn rows(&mut self, home: Home, rows: &[RowDecl]) -> EngineResult<()> {
        for row in rows {
            self.plan.add_row(row)?;
            self.home(home)?.add_row(row)?;
        }
        Ok(())
    }

    fn declare(&mut self, home: Home, name: &str) -> EngineResult<()> {
        self.plan.add_column(name);
        self.home(home)?.add_column(name);
        Ok(())
    }

    fn entries(&mut self, home: Home, entries: &[Entry]) -> EngineResult<()> {
        for entry in entries {
            if self.plan.column_index(&entry.column).is_none() {
                return Err(EngineError::Inconsistent(format!(
                    "coefficient for undeclared variable {} in row {}",
                    entry.column, entry.row
                )));
            }
            self.plan.add_entry(entry)?;
            self.home(home)?.add_entry(entry)?;
        }
        Ok(())
    }

    fn rhs(&mut self, home: Home, rhs: &[RhsEntry]) -> EngineResult<()> {
        for value in rhs {
            self.plan.set_rhs(value)?;
            self.home(home)?.set_rhs(value)?;
        }
        Ok(())
    }

    fn bounds(&mut self, home: Home, bounds: &[BoundEntry]) -> EngineResult<()> {
        for bound in bounds {
            self.plan.apply_bound(bound)?;
            self.home(home)?.apply_bound(bound)?;
        }
        Ok(())
    }
}

/// Builds [`PlanModels`] from a validated network.
pub struct ModelBuilder<'a> {
    ctx: &'a ModelContext<'a>,
    network: &'a Network,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(ctx: &'a ModelContext<'a>, network: &'a Network) -> Self {
        Self { ctx, network }
    }

    pub fn build(&self) -> EngineResult<PlanModels> {
        let years = self.ctx.horizon.years();
        let mut asm = Assembly::new(years);
        let mut events = EventTable::from_specs(&self.ctx.config.events, years);

        for year in 1..=years {
            let name = format!("opcost{}", self.ctx.horizon.year_label(year));
            asm.master.add_column(&name);
            asm.master.add_entry(&Entry::new(&name, OBJECTIVE_ROW, 1.0))?;
        }

        self.declare_rows(&mut asm)?;
        self.capacities(&mut asm, &mut events)?;
        self.investments(&mut asm)?;
        self.emissions(&mut asm)?;
        self.margins(&mut asm)?;
        self.flows(&mut asm)?;
        self.unserved(&mut asm)?;
        self.ramp_headroom(&mut asm)?;
        self.reserves(&mut asm)?;
        self.angles(&mut asm)?;

        for arc in &self.network.arcs {
            asm.rhs(Home::Master, &arc.rhs(self.ctx))?;
        }
        for node in &self.network.nodes {
            asm.rhs(Home::Year(node.year()), &node.rhs(self.ctx))?;
        }

        info!(
            rows = asm.plan.num_rows(),
            columns = asm.plan.num_columns(),
            years,
            capacities = asm.registry.get(VariableFamily::Capacity).len(),
            "Built planning models"
        );

        Ok(PlanModels {
            plan: asm.plan,
            master: asm.master,
            subproblems: asm.subproblems,
            registry: asm.registry,
            events,
        })
    }

    fn declare_rows(&self, asm: &mut Assembly) -> EngineResult<()> {
        let ctx = self.ctx;
        for node in &self.network.nodes {
            asm.rows(Home::Year(node.year()), &node.balance_rows())?;
            asm.rows(Home::Master, &node.peak_rows())?;
        }
        for arc in &self.network.arcs {
            let year = Home::Year(arc.year());
            asm.rows(year, &arc.upper_bound_rows(ctx))?;
            asm.rows(Home::Master, &arc.ramp_limit_rows(ctx))?;
            asm.rows(Home::Master, &arc.capacity_rows(ctx))?;
            asm.rows(year, &arc.dc_rows(ctx))?;
        }
        for metric in ctx.metrics() {
            for year in 1..=ctx.horizon.years() {
                let row = RowDecl::new(RowSense::Equal, ctx.metric_row(metric, year));
                asm.rows(Home::Year(year), &[row])?;
            }
        }
        Ok(())
    }

    fn register_arc(&self, asm: &mut Assembly, family: VariableFamily, arc: &Arc, name: &str) {
        asm.registry.get_mut(family).add(
            arc.asset,
            arc.from_step.column(&self.ctx.horizon),
            arc.year(),
            name,
        );
    }

    fn register_node(&self, asm: &mut Assembly, family: VariableFamily, node: &Node, name: &str) {
        asm.registry.get_mut(family).add(
            node.site,
            node.step.column(&self.ctx.horizon),
            node.year(),
            name,
        );
    }

    /// Capacity variables live in the master; each year's subproblem holds a
    /// copy carrying the per-step limits.
    fn capacities(&self, asm: &mut Assembly, events: &mut EventTable) -> EngineResult<()> {
        let ctx = self.ctx;
        let width = ctx.event_count() + 1;
        for arc in self.network.arcs.iter().filter(|a| a.owns_capacity(ctx)) {
            let name = format!("cap{}", arc.code());
            let year = Home::Year(arc.year());
            self.register_arc(asm, VariableFamily::Capacity, arc, &name);

            asm.plan.add_column(&name);
            asm.master.add_column(&name);
            asm.home(year)?.add_column(&name);
            for entry in arc.capacity_columns(ctx, CapacityPart::Full)? {
                asm.plan.add_entry(&entry)?;
            }
            for entry in arc.capacity_columns(ctx, CapacityPart::Master)? {
                asm.master.add_entry(&entry)?;
            }
            for entry in arc.capacity_columns(ctx, CapacityPart::Subproblem)? {
                asm.home(year)?.add_entry(&entry)?;
            }
            events.push_capacity(
                arc.event_multipliers(ctx)
                    .unwrap_or_else(|| vec![1.0; width]),
            );
        }
        Ok(())
    }

    fn investments(&self, asm: &mut Assembly) -> EngineResult<()> {
        let ctx = self.ctx;
        for arc in self.network.arcs.iter().filter(|a| a.has_investment(ctx)) {
            let name = format!("inv{}", arc.code());
            self.register_arc(asm, VariableFamily::Investment, arc, &name);
            asm.declare(Home::Master, &name)?;
            asm.entries(Home::Master, &arc.investment_columns(ctx))?;
            asm.bounds(Home::Master, &arc.investment_bounds(ctx))?;
        }
        Ok(())
    }

    /// Yearly metric accumulators `Em<metric><Yn>`, metric-major.
    fn emissions(&self, asm: &mut Assembly) -> EngineResult<()> {
        let ctx = self.ctx;
        for (i, metric) in ctx.metrics().iter().enumerate() {
            for year in 1..=ctx.horizon.years() {
                let row = ctx.metric_row(metric, year);
                let name = format!("Em{}", row);
                let home = Home::Year(year);
                asm.registry
                    .get_mut(VariableFamily::Emission)
                    .add(i, year as usize, year, &name);
                asm.declare(home, &name)?;
                asm.entries(home, &[Entry::new(&name, &row, -1.0)])?;
                asm.bounds(home, &[BoundEntry::new(BoundKind::Free, &name, 0.0)])?;
            }
        }
        Ok(())
    }

    fn margins(&self, asm: &mut Assembly) -> EngineResult<()> {
        for kind in MarginKind::ALL {
            let family = match kind {
                MarginKind::Reserve => VariableFamily::ReserveMargin,
                MarginKind::Regulation => VariableFamily::RegulationMargin,
                MarginKind::Ramp(ResponseSpeed::TenMinute) => VariableFamily::RampMargin10,
                MarginKind::Ramp(ResponseSpeed::ThirtyMinute) => VariableFamily::RampMargin30,
                MarginKind::Ramp(_) => VariableFamily::RampMargin60,
            };
            for node in self.network.nodes.iter().filter(|n| n.has_peak_rows()) {
                let name = node.margin_column_name(kind);
                self.register_node(asm, family, node, &name);
                asm.declare(Home::Master, &name)?;
                asm.entries(Home::Master, &node.margin_columns(self.ctx, kind))?;
                asm.bounds(Home::Master, &node.margin_bounds(kind))?;
            }
        }
        Ok(())
    }

    fn flows(&self, asm: &mut Assembly) -> EngineResult<()> {
        for arc in self.network.arcs.iter().filter(|a| a.has_flow_variable()) {
            let name = arc.code();
            let home = Home::Year(arc.year());
            self.register_arc(asm, VariableFamily::Flow, arc, &name);
            asm.declare(home, &name)?;
            asm.entries(home, &arc.flow_columns(self.ctx)?)?;
            asm.bounds(home, &arc.flow_bounds())?;
        }
        Ok(())
    }

    fn unserved(&self, asm: &mut Assembly) -> EngineResult<()> {
        for node in self.network.nodes.iter().filter(|n| n.unserved_cost.is_some()) {
            let name = node.unserved_column_name();
            let home = Home::Year(node.year());
            self.register_node(asm, VariableFamily::Unserved, node, &name);
            asm.declare(home, &name)?;
            asm.entries(home, &node.unserved_columns())?;
        }
        Ok(())
    }

    fn ramp_headroom(&self, asm: &mut Assembly) -> EngineResult<()> {
        let ctx = self.ctx;
        for speed in ResponseSpeed::RAMPS {
            let family = match speed {
                ResponseSpeed::TenMinute => VariableFamily::RampHeadroom10,
                ResponseSpeed::ThirtyMinute => VariableFamily::RampHeadroom30,
                _ => VariableFamily::RampHeadroom60,
            };
            for arc in &self.network.arcs {
                if !arc.provides_reserves() || !arc.is_first_in_year(ctx) {
                    continue;
                }
                let name = format!("CAP{}{}", speed.suffix(), arc.code());
                self.register_arc(asm, family, arc, &name);
                asm.declare(Home::Master, &name)?;
                asm.entries(Home::Master, &arc.ramp_headroom_columns(ctx, speed))?;
            }
        }
        Ok(())
    }

    fn reserves(&self, asm: &mut Assembly) -> EngineResult<()> {
        for service in ReserveService::ALL {
            let family = match service {
                ReserveService::ContingencyReserve => VariableFamily::ContingencyReserve,
                ReserveService::OperationalReserve => VariableFamily::OperationalReserve,
                ReserveService::RegulationUp => VariableFamily::RegulationUp,
                ReserveService::RegulationDown => VariableFamily::RegulationDown,
            };
            for arc in self.network.arcs.iter().filter(|a| a.provides_reserves()) {
                let name = format!("{}{}", service.prefix(), arc.code());
                let home = Home::Year(arc.year());
                self.register_arc(asm, family, arc, &name);
                asm.declare(home, &name)?;
                asm.entries(home, &arc.reserve_columns(self.ctx, service))?;
            }
        }
        Ok(())
    }

    fn angles(&self, asm: &mut Assembly) -> EngineResult<()> {
        let ctx = self.ctx;
        for node in self.network.nodes.iter().filter(|n| n.is_dc_flow(ctx)) {
            let name = node.angle_column_name();
            let home = Home::Year(node.year());
            self.register_node(asm, VariableFamily::DcAngle, node, &name);
            asm.declare(home, &name)?;
            asm.bounds(home, &node.angle_bounds(ctx))?;
        }
        for arc in &self.network.arcs {
            let entries = arc.dc_angle_entries(ctx);
            if !entries.is_empty() {
                debug!(arc = %arc, "Adding DC power-flow angle terms");
                asm.entries(Home::Year(arc.year()), &entries)?;
            }
        }
        Ok(())
    }
}
