//! Column coefficients of arc variables.

use super::Arc;
use crate::config::{ModelContext, ResponseSpeed};
use crate::error::{GridplanError, GridplanResult};
use crate::records::{Entry, OBJECTIVE_ROW};
use crate::step::Step;

/// Which half of a capacity column to generate.
///
/// The master problem keeps the investment link and the yearly peak and
/// ramp margins; the operating subproblems keep the per-step limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityPart {
    Full,
    Master,
    Subproblem,
}

impl CapacityPart {
    fn master(self) -> bool {
        matches!(self, CapacityPart::Full | CapacityPart::Master)
    }

    fn subproblem(self) -> bool {
        matches!(self, CapacityPart::Full | CapacityPart::Subproblem)
    }
}

/// Reserve products served by a ramping arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveService {
    ContingencyReserve,
    OperationalReserve,
    RegulationUp,
    RegulationDown,
}

impl ReserveService {
    pub const ALL: [ReserveService; 4] = [
        ReserveService::ContingencyReserve,
        ReserveService::OperationalReserve,
        ReserveService::RegulationUp,
        ReserveService::RegulationDown,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            ReserveService::ContingencyReserve => "CR_",
            ReserveService::OperationalReserve => "CRop_",
            ReserveService::RegulationUp => "RU_",
            ReserveService::RegulationDown => "RD_",
        }
    }
}

impl Arc {
    /// Coefficients of the operating flow variable.
    pub fn flow_columns(&self, ctx: &ModelContext<'_>) -> GridplanResult<Vec<Entry>> {
        let mut out = Vec::new();
        if !self.has_flow_variable() {
            return Ok(out);
        }
        let col = self.code();
        if self.op_cost != 0.0 {
            out.push(Entry::new(&col, OBJECTIVE_ROW, self.op_cost));
        }
        self.push_metrics(ctx, &col, 1.0, &mut out);

        if self.is_transport() {
            if !self.to.is_phantom() {
                out.push(Entry::new(&col, self.destination_row(), 1.0));
            }
            if let Some(kind) = self.infrastructure {
                let fleet = self.from.with_kind(self.from.first_char(), self.from.first_char());
                let infra = self.from.with_kind(kind, kind);
                out.push(Entry::new(&col, format!("ub{}{}", fleet, self.from_step), 1.0));
                out.push(Entry::new(&col, format!("ub{}{}", infra, self.from_step), 1.0));
            }
            return Ok(out);
        }

        if !self.from.is_phantom() {
            let value = if self.invert_efficiency {
                -1.0 / self.efficiency
            } else {
                -1.0
            };
            out.push(Entry::new(&col, self.origin_row(), value));
        }
        if !self.to.is_phantom() {
            let value = if self.invert_efficiency {
                1.0
            } else {
                self.efficiency
            };
            out.push(Entry::new(&col, self.destination_row(), value));
        }
        if self.op_max.is_some() {
            out.push(Entry::new(&col, format!("ub{}", col), 1.0));
        }
        if self.provides_reserves() {
            out.push(Entry::new(&col, format!("ubR{}", col), 1.0));
            out.push(Entry::new(&col, format!("lbR{}", col), 1.0));
            let outage = &self.outage;
            if outage.rate != 0.0 && outage.base_gwh != 0.0 {
                let hours = self.to_step.hours(&ctx.horizon);
                let value = -self.efficiency * outage.rate * outage.avg_gw * hours / outage.base_gwh;
                out.push(Entry::new(&col, format!("RCRop{}", self.destination_row()), value));
            }
        }
        if self.energy_to_transport {
            let coupled = crate::code::NodeCode::coupled_transport(&self.from, &self.to)?;
            out.push(Entry::new(&col, format!("{}{}", coupled, self.to_step), -1.0));
        }
        for load in &self.transport_to_energy {
            out.push(Entry::new(&col, &load.node, -load.coefficient));
        }
        if self.is_dc_flow(ctx) {
            if self.from < self.to {
                out.push(Entry::new(&col, format!("dcpf{}", col), -1.0));
            } else {
                let mirror = format!(
                    "dcpf{}{}_{}{}",
                    self.to, self.to_step, self.from, self.from_step
                );
                out.push(Entry::new(&col, mirror, 1.0));
            }
        }
        Ok(out)
    }

    /// Angle terms of the DC power-flow row, emitted by the owning direction.
    pub fn dc_angle_entries(&self, ctx: &ModelContext<'_>) -> Vec<Entry> {
        if !self.is_dc_flow(ctx) || self.from >= self.to {
            return Vec::new();
        }
        let row = format!("dcpf{}", self.code());
        vec![
            Entry::new(format!("th{}", self.origin_row()), &row, self.susceptance),
            Entry::new(format!("th{}", self.destination_row()), &row, -self.susceptance),
        ]
    }

    /// Coefficients of one reserve product column.
    pub fn reserve_columns(&self, ctx: &ModelContext<'_>, service: ReserveService) -> Vec<Entry> {
        let mut out = Vec::new();
        if !self.provides_reserves() {
            return out;
        }
        let code = self.code();
        let col = format!("{}{}", service.prefix(), code);
        let node = self.destination_row();
        let costs = &self.service_costs;
        let calib = ctx.reserves();
        match service {
            ReserveService::ContingencyReserve => {
                out.push(Entry::new(&col, format!("ubR{}", code), 1.0));
                out.push(Entry::new(&col, format!("RCR{}", node), 1.0));
                out.push(Entry::new(&col, format!("U1CR{}", code), 1.0));
                out.push(Entry::new(&col, format!("U2CR{}", code), 1.0));
                out.push(Entry::new(&col, format!("ubRop{}", code), -1.0));
            }
            ReserveService::OperationalReserve => {
                let cost = self.op_cost + costs.voc_reserve;
                if cost != 0.0 {
                    out.push(Entry::new(&col, OBJECTIVE_ROW, cost));
                }
                out.push(Entry::new(&col, format!("ubRop{}", code), 1.0));
                out.push(Entry::new(&col, format!("RCRop{}", node), 1.0));
                self.push_fuel(&col, -(1.0 + costs.hrd_reserve), &mut out);
                self.push_metrics(ctx, &col, 1.0 + costs.hrd_reserve, &mut out);
            }
            ReserveService::RegulationUp => {
                let sigma = calib.regulation_up_sigma;
                let cost = (self.op_cost + costs.voc_regulation) / sigma;
                if cost != 0.0 {
                    out.push(Entry::new(&col, OBJECTIVE_ROW, cost));
                }
                out.push(Entry::new(&col, format!("ubR{}", code), 1.0));
                out.push(Entry::new(&col, format!("RRU{}", node), 1.0));
                out.push(Entry::new(&col, format!("U1RU{}", code), 1.0));
                self.push_fuel(
                    &col,
                    -calib.regulation_up_fuel * (1.0 + costs.hrd_regulation),
                    &mut out,
                );
                self.push_metrics(ctx, &col, (1.0 + costs.hrd_regulation) / sigma, &mut out);
            }
            ReserveService::RegulationDown => {
                let sigma = calib.regulation_down_sigma;
                let cost = -(self.op_cost + costs.voc_regulation) / sigma;
                if cost != 0.0 {
                    out.push(Entry::new(&col, OBJECTIVE_ROW, cost));
                }
                out.push(Entry::new(&col, format!("lbR{}", code), -1.0));
                out.push(Entry::new(&col, format!("RRD{}", node), 1.0));
                out.push(Entry::new(&col, format!("U1RD{}", code), 1.0));
                self.push_fuel(
                    &col,
                    calib.regulation_down_fuel * (1.0 - costs.hrd_regulation),
                    &mut out,
                );
                self.push_metrics(ctx, &col, -(1.0 - costs.hrd_regulation) / sigma, &mut out);
            }
        }
        out
    }

    /// Ramp headroom column for one response speed (`CAP10` ...).
    pub fn ramp_headroom_columns(&self, ctx: &ModelContext<'_>, speed: ResponseSpeed) -> Vec<Entry> {
        if !self.provides_reserves() || !self.is_first_in_year(ctx) {
            return Vec::new();
        }
        let code = self.code();
        let suffix = speed.suffix();
        let col = format!("CAP{}{}", suffix, code);
        vec![
            Entry::new(
                &col,
                format!("rp{}{}", suffix, self.destination_row()),
                self.ramp_rate * speed.minutes(),
            ),
            Entry::new(&col, format!("L{}{}", suffix, code), 1.0),
            Entry::new(&col, format!("LCAP{}{}", suffix, code), 1.0),
        ]
    }

    /// Investment column: cost plus a `-1` in every `inv2cap` row the new
    /// capacity stays in service for.
    pub fn investment_columns(&self, ctx: &ModelContext<'_>) -> Vec<Entry> {
        let mut out = Vec::new();
        if !self.has_investment(ctx) {
            return out;
        }
        let code = self.code();
        let col = format!("inv{}", code);
        if let Some(cost) = self.inv_cost {
            out.push(Entry::new(&col, OBJECTIVE_ROW, cost));
        }

        let end = ctx.horizon.last_step();
        let max_step = match self.lifespan {
            Some(years) => std::cmp::min(self.from_step.add_years(years), end),
            None => end,
        };
        let mirror = (self.is_first_bidirectional(ctx) || self.is_first_transport())
            .then(|| self.reversed());

        let mut step1 = self.from_step.clone();
        let mut step2 = self.to_step.clone();
        let mut guide = self.guide_step(ctx).clone();
        while guide <= max_step {
            out.push(Entry::new(
                &col,
                format!("inv2cap{}", self.code_at(&step1, &step2)),
                -1.0,
            ));
            if let Some(mirror) = &mirror {
                out.push(Entry::new(
                    &col,
                    format!("inv2cap{}", mirror.code_at(&step1, &step2)),
                    -1.0,
                ));
            }
            step1 = step1.add_years(1);
            step2 = step2.add_years(1);
            guide = guide.add_years(1);
        }
        out
    }

    /// Capacity column, split between master and subproblem parts.
    pub fn capacity_columns(
        &self,
        ctx: &ModelContext<'_>,
        part: CapacityPart,
    ) -> GridplanResult<Vec<Entry>> {
        let mut out = Vec::new();
        if !self.owns_capacity(ctx) {
            return Ok(out);
        }
        let code = self.code();
        let col = format!("cap{}", code);
        let rr = self.ramp_rate;
        let reserves = self.provides_reserves();

        if part.subproblem() {
            let horizon = &ctx.horizon;
            let calib = ctx.reserves();
            let regulation = if self.regulation.p_regulation != 0.0 {
                Some(self.wind_regulation(ctx, ResponseSpeed::OneMinute, &self.to_step)?)
            } else {
                None
            };

            let mut guide = self.guide_step(ctx).clone();
            let stop = if self.is_storage(ctx) {
                self.from_step.add_years(1)
            } else {
                guide.add_years(1)
            };
            let mut step1 = self.from_step.clone();
            let mut step2 = self.to_step.clone();
            while guide < stop {
                let hours = guide.hours(horizon);
                let k = self.code_at(&step1, &step2);
                out.push(Entry::new(&col, format!("ub{}", k), -hours));
                if reserves {
                    out.push(Entry::new(&col, format!("ubR{}", k), -hours));
                    out.push(Entry::new(&col, format!("U1CR{}", k), -rr * 10.0 * hours));
                    out.push(Entry::new(&col, format!("U2CR{}", k), -hours));
                    out.push(Entry::new(&col, format!("U1RU{}", k), -rr * hours));
                    out.push(Entry::new(&col, format!("U1RD{}", k), -rr * hours));
                }
                if let Some(dsq) = regulation {
                    let node = format!("{}{}", self.to, step2);
                    out.push(Entry::new(
                        &col,
                        format!("RRU{}", node),
                        -calib.regulation_up_sigma * dsq * hours,
                    ));
                    out.push(Entry::new(
                        &col,
                        format!("RRD{}", node),
                        -calib.regulation_down_sigma * dsq * hours,
                    ));
                }
                guide = guide.next(horizon);
                step1 = advance(step1, &guide, ctx);
                step2 = advance(step2, &guide, ctx);
            }
        }

        if part.master() {
            let node = self.destination_row();
            let calib = ctx.reserves();
            out.push(Entry::new(&col, format!("inv2cap{}", code), 1.0));
            if self.capacity_factor != 0.0 {
                out.push(Entry::new(&col, format!("pk{}", node), self.capacity_factor));
            }
            if reserves {
                out.push(Entry::new(&col, format!("rc{}", node), rr));
                for speed in ResponseSpeed::RAMPS {
                    let suffix = speed.suffix();
                    out.push(Entry::new(
                        &col,
                        format!("L{}{}", suffix, code),
                        -1.0 / (speed.minutes() * rr),
                    ));
                    out.push(Entry::new(&col, format!("LCAP{}{}", suffix, code), -1.0));
                }
            }
            if self.regulation.p_regulation != 0.0 {
                let dsq = self.wind_regulation(ctx, ResponseSpeed::OneMinute, &self.to_step)?;
                out.push(Entry::new(
                    &col,
                    format!("rc{}", node),
                    -dsq * calib.peak(ResponseSpeed::OneMinute),
                ));
            }
            for speed in ResponseSpeed::RAMPS {
                if self.regulation.percent(speed) != 0.0 {
                    let dsq = self.wind_regulation(ctx, speed, &self.to_step)?;
                    out.push(Entry::new(
                        &col,
                        format!("rp{}{}", speed.suffix(), node),
                        -dsq * calib.peak(speed),
                    ));
                }
            }
        }
        Ok(out)
    }

    /// Requirement per unit of capacity from variable output:
    /// `(p·W/100)² / (2·W·aggregate)`.
    fn wind_regulation(
        &self,
        ctx: &ModelContext<'_>,
        speed: ResponseSpeed,
        step: &Step,
    ) -> GridplanResult<f64> {
        let w = self.regulation.w_base;
        if w <= 0.0 {
            return Err(GridplanError::Validation(format!(
                "arc {} has a regulation response but no positive w_base",
                self.code()
            )));
        }
        let node_row = format!("{}{}", self.to, step);
        let aggregate = ctx
            .config
            .aggregate_load
            .lookup(speed, &node_row, self.to.as_str())?;
        let share = self.regulation.percent(speed) * w / 100.0;
        Ok(share * share / (2.0 * w * aggregate))
    }

    fn push_metrics(&self, ctx: &ModelContext<'_>, col: &str, scale: f64, out: &mut Vec<Entry>) {
        for (metric, rate) in ctx.metrics().iter().zip(&self.metric_rates) {
            if *rate != 0.0 {
                out.push(Entry::new(col, ctx.metric_row(metric, self.year()), rate * scale));
            }
        }
    }

    fn push_fuel(&self, col: &str, value: f64, out: &mut Vec<Entry>) {
        if !self.from.is_phantom() {
            out.push(Entry::new(col, self.origin_row(), value));
        }
    }
}

/// Move an endpoint step forward once the guide step has passed it.
fn advance(step: Step, guide: &Step, ctx: &ModelContext<'_>) -> Step {
    let next = step.next(&ctx.horizon);
    if next <= *guide {
        next
    } else {
        step
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{arc, config, step};
    use super::*;

    fn entry<'a>(entries: &'a [Entry], row: &str) -> Option<&'a Entry> {
        entries.iter().find(|e| e.row == row)
    }

    #[test]
    fn test_flow_and_upper_bound_pair() {
        let config = config(2, 2);
        let ctx = ModelContext::new(&config).unwrap();
        let mut a = arc("NGNY", "ELNY", "Y1B2", &ctx);
        a.op_max = Some(8.0);
        a.op_cost = 3.0;
        a.efficiency = 0.4;
        a.metric_rates = vec![0.2];

        let ub = &a.upper_bound_rows(&ctx)[0].name;
        let cols = a.flow_columns(&ctx).unwrap();
        let e = entry(&cols, ub).unwrap();
        assert_eq!(e.column, a.code());
        assert_eq!(e.value, 1.0);

        assert_eq!(entry(&cols, OBJECTIVE_ROW).unwrap().value, 3.0);
        assert_eq!(entry(&cols, "NGNYY1B2").unwrap().value, -1.0);
        assert_eq!(entry(&cols, "ELNYY1B2").unwrap().value, 0.4);
        assert_eq!(entry(&cols, "CO2Y1").unwrap().value, 0.2);
    }

    #[test]
    fn test_inverted_efficiency_and_phantom() {
        let config = config(2, 2);
        let ctx = ModelContext::new(&config).unwrap();
        let mut a = arc("XXNY", "ELNY", "Y1B1", &ctx);
        a.efficiency = 0.5;
        a.invert_efficiency = true;
        let cols = a.flow_columns(&ctx).unwrap();
        assert!(entry(&cols, "XXNYY1B1").is_none());
        assert_eq!(entry(&cols, "ELNYY1B1").unwrap().value, 1.0);

        let mut b = arc("NGNY", "XXNY", "Y1B1", &ctx);
        b.efficiency = 0.5;
        b.invert_efficiency = true;
        let cols = b.flow_columns(&ctx).unwrap();
        assert_eq!(entry(&cols, "NGNYY1B1").unwrap().value, -2.0);
    }

    #[test]
    fn test_transport_with_infrastructure() {
        let config = config(2, 2);
        let ctx = ModelContext::new(&config).unwrap();
        let mut a = arc("TCNYPA", "TCNYPA", "Y1B1", &ctx);
        a.infrastructure = Some('R');
        let cols = a.flow_columns(&ctx).unwrap();
        assert_eq!(entry(&cols, "TCNYPAY1B1").unwrap().value, 1.0);
        assert!(entry(&cols, "ubTTNYPAY1B1").is_some());
        assert!(entry(&cols, "ubRRNYPAY1B1").is_some());

        let fleet = arc("TTNYPA", "TTNYPA", "Y1B1", &ctx);
        assert!(fleet.flow_columns(&ctx).unwrap().is_empty());
    }

    #[test]
    fn test_couplings() {
        let config = config(2, 2);
        let ctx = ModelContext::new(&config).unwrap();
        let mut a = arc("COPA", "CONY", "Y1B1", &ctx);
        a.energy_to_transport = true;
        a.transport_to_energy = vec![super::super::TransportLoad {
            node: "DLPAY1B1".into(),
            coefficient: 0.3,
        }];
        let cols = a.flow_columns(&ctx).unwrap();
        assert_eq!(entry(&cols, "COPANYY1B1").unwrap().value, -1.0);
        assert_eq!(entry(&cols, "DLPAY1B1").unwrap().value, -0.3);
    }

    #[test]
    fn test_dc_flow_signs_and_angles() {
        let mut config = config(2, 2);
        config.use_dc_flow = true;
        let ctx = ModelContext::new(&config).unwrap();
        let mut a = arc("ELNY", "ELPA", "Y1B1", &ctx);
        a.susceptance = 20.0;
        let cols = a.flow_columns(&ctx).unwrap();
        assert_eq!(entry(&cols, "dcpfELNYY1B1_ELPAY1B1").unwrap().value, -1.0);
        let back = a.reversed();
        let cols = back.flow_columns(&ctx).unwrap();
        assert_eq!(entry(&cols, "dcpfELNYY1B1_ELPAY1B1").unwrap().value, 1.0);

        let angles = a.dc_angle_entries(&ctx);
        assert_eq!(angles.len(), 2);
        assert_eq!(angles[0].column, "thELNYY1B1");
        assert_eq!(angles[1].value, -20.0);
        assert!(back.dc_angle_entries(&ctx).is_empty());
    }

    #[test]
    fn test_investment_reaches_lifespan_or_horizon_end() {
        let config = config(5, 2);
        let ctx = ModelContext::new(&config).unwrap();
        for (start, lifespan, expected) in [
            ("Y1B1", Some(2), 3),
            ("Y3B1", Some(10), 3),
            ("Y2B1", None, 4),
            ("Y5B1", Some(0), 1),
        ] {
            let mut a = arc("NGNY", "ELNY", start, &ctx);
            a.op_max = Some(0.0);
            a.inv_cost = Some(50.0);
            a.lifespan = lifespan;
            let cols = a.investment_columns(&ctx);
            let links: Vec<_> = cols.iter().filter(|e| e.row.starts_with("inv2cap")).collect();
            assert_eq!(links.len(), expected, "start {} lifespan {:?}", start, lifespan);
            assert!(links.iter().all(|e| e.value == -1.0));
            assert_eq!(entry(&cols, OBJECTIVE_ROW).unwrap().value, 50.0);
        }
    }

    #[test]
    fn test_investment_feeds_mirror_direction() {
        let config = config(2, 1);
        let ctx = ModelContext::new(&config).unwrap();
        let mut a = arc("ELNY", "ELPA", "Y2B1", &ctx);
        a.op_max = Some(0.0);
        a.inv_cost = Some(50.0);
        let cols = a.investment_columns(&ctx);
        assert!(entry(&cols, "inv2capELNYY2B1_ELPAY2B1").is_some());
        assert!(entry(&cols, "inv2capELPAY2B1_ELNYY2B1").is_some());
    }

    #[test]
    fn test_capacity_parts() {
        let config = config(2, 2);
        let ctx = ModelContext::new(&config).unwrap();
        let mut a = arc("NGNY", "ELNY", "Y1B1", &ctx);
        a.op_max = Some(5.0);
        a.capacity_factor = 0.9;

        let sub = a.capacity_columns(&ctx, CapacityPart::Subproblem).unwrap();
        let ub_rows: Vec<_> = sub.iter().map(|e| e.row.as_str()).collect();
        assert_eq!(ub_rows, vec!["ubNGNYY1B1_ELNYY1B1", "ubNGNYY1B2_ELNYY1B2"]);
        assert!(sub.iter().all(|e| e.value == -10.0));

        let master = a.capacity_columns(&ctx, CapacityPart::Master).unwrap();
        assert_eq!(entry(&master, "inv2capNGNYY1B1_ELNYY1B1").unwrap().value, 1.0);
        assert_eq!(entry(&master, "pkELNYY1B1").unwrap().value, 0.9);

        let full = a.capacity_columns(&ctx, CapacityPart::Full).unwrap();
        assert_eq!(full.len(), sub.len() + master.len());
    }

    #[test]
    fn test_ramping_capacity_terms() {
        let config = config(1, 1);
        let ctx = ModelContext::new(&config).unwrap();
        let mut a = arc("NGNY", "ELNY", "Y1B1", &ctx);
        a.op_max = Some(5.0);
        a.ramp_rate = 0.5;
        let cols = a.capacity_columns(&ctx, CapacityPart::Full).unwrap();
        assert_eq!(entry(&cols, "U1CRNGNYY1B1_ELNYY1B1").unwrap().value, -50.0);
        assert_eq!(entry(&cols, "rcELNYY1B1").unwrap().value, 0.5);
        assert_eq!(entry(&cols, "L10NGNYY1B1_ELNYY1B1").unwrap().value, -0.2);

        let headroom = a.ramp_headroom_columns(&ctx, ResponseSpeed::ThirtyMinute);
        assert_eq!(entry(&headroom, "rp30ELNYY1B1").unwrap().value, 15.0);
    }

    #[test]
    fn test_wind_regulation_needs_aggregate_load() {
        let mut config = config(1, 1);
        let ctx_missing = {
            let mut a = arc_with_regulation(&config);
            a.regulation.w_base = 100.0;
            let ctx = ModelContext::new(&config).unwrap();
            a.capacity_columns(&ctx, CapacityPart::Master).is_err()
        };
        assert!(ctx_missing);

        config.aggregate_load.one_minute.insert("ELNY".into(), 50.0);
        let ctx = ModelContext::new(&config).unwrap();
        let mut a = arc_with_regulation(&config);
        a.regulation.w_base = 100.0;
        let cols = a.capacity_columns(&ctx, CapacityPart::Full).unwrap();
        // (10 * 100 / 100)^2 / (2 * 100 * 50) = 0.01
        let rru = entry(&cols, "RRUELNYY1B1").unwrap().value;
        assert!((rru - (-3.0 * 0.01 * 10.0)).abs() < 1e-12);
        assert!((entry(&cols, "rcELNYY1B1").unwrap().value + 0.01).abs() < 1e-12);
    }

    fn arc_with_regulation(config: &crate::config::PlanConfig) -> Arc {
        let horizon = config.horizon().unwrap();
        let s = step("Y1B1", &horizon);
        let mut a = Arc::new(
            crate::code::NodeCode::new("WNNY").unwrap(),
            crate::code::NodeCode::new("ELNY").unwrap(),
            s.clone(),
            s,
        );
        a.op_max = Some(2.0);
        a.regulation.p_regulation = 10.0;
        a
    }

    #[test]
    fn test_reserve_columns() {
        let config = config(1, 1);
        let ctx = ModelContext::new(&config).unwrap();
        let mut a = arc("NGNY", "ELNY", "Y1B1", &ctx);
        a.op_max = Some(5.0);
        a.ramp_rate = 0.5;
        a.op_cost = 6.0;
        a.metric_rates = vec![1.0];
        a.service_costs.voc_regulation = 1.0;

        let ru = a.reserve_columns(&ctx, ReserveService::RegulationUp);
        assert_eq!(ru[0].column, "RU_NGNYY1B1_ELNYY1B1");
        assert!((entry(&ru, OBJECTIVE_ROW).unwrap().value - 7.0 / 3.0).abs() < 1e-12);
        assert!((entry(&ru, "NGNYY1B1").unwrap().value + 0.33333).abs() < 1e-12);

        let rd = a.reserve_columns(&ctx, ReserveService::RegulationDown);
        assert_eq!(entry(&rd, "lbRNGNYY1B1_ELNYY1B1").unwrap().value, -1.0);
        assert!((entry(&rd, "NGNYY1B1").unwrap().value - 0.285).abs() < 1e-12);
        assert!((entry(&rd, "CO2Y1").unwrap().value + 1.0 / 3.5).abs() < 1e-12);

        let cr = a.reserve_columns(&ctx, ReserveService::ContingencyReserve);
        assert_eq!(cr.len(), 5);

        a.ramp_rate = 0.0;
        assert!(a.reserve_columns(&ctx, ReserveService::OperationalReserve).is_empty());
    }
}
