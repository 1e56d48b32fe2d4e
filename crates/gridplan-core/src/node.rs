//! Nodes: demand points and reserve requirements at one time step.

use std::f64::consts::PI;
use std::str::FromStr;

use crate::code::NodeCode;
use crate::config::{ModelContext, ResponseSpeed};
use crate::error::{GridplanError, GridplanResult};
use crate::records::{BoundEntry, Entry, RhsEntry, RowDecl, RowSense, OBJECTIVE_ROW};
use crate::step::Step;

/// A network node at one time step.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub code: NodeCode,
    pub step: Step,
    /// Logical site this node belongs to (registry position).
    pub site: usize,
    /// `None` leaves the balance row unconstrained.
    pub demand: Option<f64>,
    /// Penalty per unit of unserved demand; `None` disallows shedding.
    pub unserved_cost: Option<f64>,
    pub peak_power: Option<f64>,
    pub regulation: Option<f64>,
    pub ramp10: Option<f64>,
    pub ramp30: Option<f64>,
    pub ramp60: Option<f64>,
    pub contingency_reserve: Option<f64>,
    /// Hours represented by the step.
    pub step_length: f64,
}

/// Margin variables attached to the yearly peak rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginKind {
    /// `RM_`: firm capacity over peak demand
    Reserve,
    /// `RMrc_`: regulation capability
    Regulation,
    /// `RMrp10_`, `RMrp30_`, `RMrp60_`
    Ramp(ResponseSpeed),
}

impl MarginKind {
    pub const ALL: [MarginKind; 5] = [
        MarginKind::Reserve,
        MarginKind::Regulation,
        MarginKind::Ramp(ResponseSpeed::TenMinute),
        MarginKind::Ramp(ResponseSpeed::ThirtyMinute),
        MarginKind::Ramp(ResponseSpeed::SixtyMinute),
    ];

    fn column_prefix(self) -> String {
        match self {
            MarginKind::Reserve => "RM_".to_string(),
            MarginKind::Regulation => "RMrc_".to_string(),
            MarginKind::Ramp(speed) => format!("RMrp{}_", speed.suffix()),
        }
    }

    fn row_prefix(self) -> String {
        match self {
            MarginKind::Reserve => "pk".to_string(),
            MarginKind::Regulation => "rc".to_string(),
            MarginKind::Ramp(speed) => format!("rp{}", speed.suffix()),
        }
    }
}

impl Node {
    pub fn new(code: NodeCode, step: Step, step_length: f64) -> Self {
        Self {
            code,
            step,
            site: 0,
            demand: None,
            unserved_cost: None,
            peak_power: None,
            regulation: None,
            ramp10: None,
            ramp30: None,
            ramp60: None,
            contingency_reserve: None,
            step_length,
        }
    }

    /// Balance row name: short code followed by the step label.
    pub fn row_name(&self) -> String {
        format!("{}{}", self.code, self.step)
    }

    pub fn year(&self) -> u32 {
        self.step.year()
    }

    pub fn is_first_in_year(&self) -> bool {
        self.step.is_first_in_year(1)
    }

    pub fn is_dc_electric(&self, ctx: &ModelContext<'_>) -> bool {
        self.code.kind() == ctx.config.dc_code
    }

    pub fn is_dc_flow(&self, ctx: &ModelContext<'_>) -> bool {
        ctx.config.use_dc_flow && self.is_dc_electric(ctx)
    }

    fn has_balance(&self) -> bool {
        self.demand.is_some() && !self.code.is_phantom()
    }

    pub fn has_peak_rows(&self) -> bool {
        self.peak_power.is_some() && self.is_first_in_year()
    }

    /// Balance row plus the reserve and regulation requirement rows.
    pub fn balance_rows(&self) -> Vec<RowDecl> {
        let code = self.row_name();
        let sense = if self.has_balance() {
            RowSense::Equal
        } else {
            RowSense::Free
        };
        let mut rows = vec![RowDecl::new(sense, code.clone())];
        if self.contingency_reserve.is_some() {
            rows.push(RowDecl::new(RowSense::Greater, format!("RCR{}", code)));
            rows.push(RowDecl::new(RowSense::Greater, format!("RCRop{}", code)));
        }
        if self.regulation.is_some() {
            rows.push(RowDecl::new(RowSense::Greater, format!("RRU{}", code)));
            rows.push(RowDecl::new(RowSense::Greater, format!("RRD{}", code)));
        }
        rows
    }

    /// Yearly peak and reserve margin rows.
    pub fn peak_rows(&self) -> Vec<RowDecl> {
        if !self.has_peak_rows() {
            return Vec::new();
        }
        let code = self.row_name();
        MarginKind::ALL
            .iter()
            .map(|kind| RowDecl::new(RowSense::Equal, format!("{}{}", kind.row_prefix(), code)))
            .collect()
    }

    pub fn unserved_column_name(&self) -> String {
        format!("UD_{}", self.row_name())
    }

    /// Unserved demand column.
    pub fn unserved_columns(&self) -> Vec<Entry> {
        let Some(cost) = self.unserved_cost else {
            return Vec::new();
        };
        let col = self.unserved_column_name();
        let mut out = Vec::with_capacity(2);
        if cost != 0.0 {
            out.push(Entry::new(&col, OBJECTIVE_ROW, cost));
        }
        out.push(Entry::new(&col, self.row_name(), 1.0));
        out
    }

    pub fn margin_column_name(&self, kind: MarginKind) -> String {
        format!("{}{}", kind.column_prefix(), self.row_name())
    }

    /// Margin column of one kind; the requirement enters with a negative sign
    /// so that a margin of at least 1 means the requirement is covered.
    pub fn margin_columns(&self, ctx: &ModelContext<'_>, kind: MarginKind) -> Vec<Entry> {
        if !self.has_peak_rows() {
            return Vec::new();
        }
        let calib = ctx.reserves();
        let reserve = self.contingency_reserve.unwrap_or(0.0);
        let value = match kind {
            MarginKind::Reserve => -self.peak_power.unwrap_or(0.0),
            MarginKind::Regulation => {
                -(self.regulation.unwrap_or(0.0) * calib.peak(ResponseSpeed::OneMinute))
            }
            MarginKind::Ramp(ResponseSpeed::TenMinute) => {
                -(self.ramp10.unwrap_or(0.0) * calib.peak_10 + reserve)
            }
            MarginKind::Ramp(ResponseSpeed::ThirtyMinute) => {
                -(self.ramp30.unwrap_or(0.0) * calib.peak_30 + reserve)
            }
            MarginKind::Ramp(speed) => -(self.ramp60.unwrap_or(0.0) * calib.peak(speed)),
        };
        if value == 0.0 {
            return Vec::new();
        }
        vec![Entry::new(
            self.margin_column_name(kind),
            format!("{}{}", kind.row_prefix(), self.row_name()),
            value,
        )]
    }

    pub fn margin_bounds(&self, kind: MarginKind) -> Vec<BoundEntry> {
        if !self.has_peak_rows() {
            return Vec::new();
        }
        vec![BoundEntry::lower(self.margin_column_name(kind), 1.0)]
    }

    /// Demand, contingency reserve and regulation requirements.
    pub fn rhs(&self, ctx: &ModelContext<'_>) -> Vec<RhsEntry> {
        let code = self.row_name();
        let mut out = Vec::new();
        if let Some(demand) = self.demand {
            if demand != 0.0 && self.has_balance() {
                out.push(RhsEntry::new(&code, demand));
            }
        }
        if let Some(reserve) = self.contingency_reserve {
            out.push(RhsEntry::new(format!("RCR{}", code), reserve * self.step_length));
        }
        if let Some(regulation) = self.regulation {
            let calib = ctx.reserves();
            out.push(RhsEntry::new(
                format!("RRU{}", code),
                regulation * self.step_length * calib.regulation_up_sigma,
            ));
            out.push(RhsEntry::new(
                format!("RRD{}", code),
                regulation * self.step_length * calib.regulation_down_sigma,
            ));
        }
        out
    }

    pub fn angle_column_name(&self) -> String {
        format!("th{}", self.row_name())
    }

    /// Voltage angle limits of DC-modelled nodes.
    pub fn angle_bounds(&self, ctx: &ModelContext<'_>) -> Vec<BoundEntry> {
        if !self.is_dc_flow(ctx) {
            return Vec::new();
        }
        let col = self.angle_column_name();
        vec![BoundEntry::lower(col.clone(), -PI), BoundEntry::upper(col, PI)]
    }

    pub fn scale(&mut self, attribute: NodeAttribute, factor: f64) {
        let slot = match attribute {
            NodeAttribute::Demand => &mut self.demand,
            NodeAttribute::UnservedCost => &mut self.unserved_cost,
            NodeAttribute::PeakPower => &mut self.peak_power,
            NodeAttribute::Regulation => &mut self.regulation,
            NodeAttribute::Ramp10 => &mut self.ramp10,
            NodeAttribute::Ramp30 => &mut self.ramp30,
            NodeAttribute::Ramp60 => &mut self.ramp60,
            NodeAttribute::ContingencyReserve => &mut self.contingency_reserve,
        };
        if let Some(value) = slot.as_mut() {
            *value *= factor;
        }
    }
}

/// Node attributes that scenario adjustments may scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeAttribute {
    Demand,
    UnservedCost,
    PeakPower,
    Regulation,
    Ramp10,
    Ramp30,
    Ramp60,
    ContingencyReserve,
}

impl FromStr for NodeAttribute {
    type Err = GridplanError;

    fn from_str(s: &str) -> GridplanResult<Self> {
        match s {
            "demand" => Ok(NodeAttribute::Demand),
            "unserved_cost" => Ok(NodeAttribute::UnservedCost),
            "peak_power" => Ok(NodeAttribute::PeakPower),
            "regulation" => Ok(NodeAttribute::Regulation),
            "ramp10" => Ok(NodeAttribute::Ramp10),
            "ramp30" => Ok(NodeAttribute::Ramp30),
            "ramp60" => Ok(NodeAttribute::Ramp60),
            "contingency_reserve" => Ok(NodeAttribute::ContingencyReserve),
            other => Err(GridplanError::Validation(format!(
                "unknown node attribute '{}'",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlanConfig;
    use crate::step::{Horizon, Level};

    fn config() -> PlanConfig {
        PlanConfig {
            horizon: crate::config::HorizonConfig {
                levels: vec![Level::new('Y', 2), Level::new('B', 2)],
                step_hours: vec![6.0, 18.0],
            },
            ..Default::default()
        }
    }

    fn node(code: &str, label: &str, horizon: &Horizon) -> Node {
        let step = Step::parse(label, horizon).unwrap();
        let hours = step.hours(horizon);
        Node::new(NodeCode::new(code).unwrap(), step, hours)
    }

    #[test]
    fn test_balance_row_sense() {
        let config = config();
        let h = config.horizon().unwrap();
        let mut n = node("ELNY", "Y1B1", &h);
        assert_eq!(n.balance_rows()[0].sense, RowSense::Free);
        n.demand = Some(5.0);
        assert_eq!(n.balance_rows()[0].sense, RowSense::Equal);
        assert_eq!(n.balance_rows()[0].name, "ELNYY1B1");

        let mut phantom = node("XXNY", "Y1B1", &h);
        phantom.demand = Some(5.0);
        assert_eq!(phantom.balance_rows()[0].sense, RowSense::Free);
        let ctx = ModelContext::new(&config).unwrap();
        assert!(phantom.rhs(&ctx).is_empty());
    }

    #[test]
    fn test_requirement_rhs() {
        let config = config();
        let ctx = ModelContext::new(&config).unwrap();
        let mut n = node("ELNY", "Y1B2", &ctx.horizon);
        assert_eq!(n.step_length, 18.0);
        n.demand = Some(7.0);
        n.contingency_reserve = Some(2.0);
        n.regulation = Some(1.0);
        assert_eq!(n.balance_rows().len(), 5);
        let rhs = n.rhs(&ctx);
        let value = |row: &str| rhs.iter().find(|r| r.row == row).map(|r| r.value);
        assert_eq!(value("ELNYY1B2"), Some(7.0));
        assert_eq!(value("RCRELNYY1B2"), Some(36.0));
        assert_eq!(value("RRUELNYY1B2"), Some(54.0));
        assert_eq!(value("RRDELNYY1B2"), Some(63.0));
    }

    #[test]
    fn test_unserved_column() {
        let config = config();
        let h = config.horizon().unwrap();
        let mut n = node("ELNY", "Y1B1", &h);
        assert!(n.unserved_columns().is_empty());
        n.unserved_cost = Some(1000.0);
        let cols = n.unserved_columns();
        assert_eq!(cols[0].column, "UD_ELNYY1B1");
        assert_eq!(cols[0].value, 1000.0);
        assert_eq!(cols[1].row, "ELNYY1B1");
    }

    #[test]
    fn test_peak_rows_and_margins() {
        let config = config();
        let ctx = ModelContext::new(&config).unwrap();
        let mut n = node("ELNY", "Y2B1", &ctx.horizon);
        n.peak_power = Some(40.0);
        n.ramp10 = Some(2.0);
        n.contingency_reserve = Some(3.0);
        assert_eq!(n.peak_rows().len(), 5);

        let rm = n.margin_columns(&ctx, MarginKind::Reserve);
        assert_eq!(rm[0].row, "pkELNYY2B1");
        assert_eq!(rm[0].value, -40.0);
        let rp10 = n.margin_columns(&ctx, MarginKind::Ramp(ResponseSpeed::TenMinute));
        assert_eq!(rp10[0].column, "RMrp10_ELNYY2B1");
        assert_eq!(rp10[0].value, -5.0);
        let rp60 = n.margin_columns(&ctx, MarginKind::Ramp(ResponseSpeed::SixtyMinute));
        assert!(rp60.is_empty());
        assert_eq!(n.margin_bounds(MarginKind::Regulation)[0].value, 1.0);

        let later = node("ELNY", "Y2B2", &ctx.horizon);
        assert!(later.peak_rows().is_empty());
    }

    #[test]
    fn test_angle_bounds() {
        let mut config = config();
        config.use_dc_flow = true;
        let ctx = ModelContext::new(&config).unwrap();
        let n = node("ELNY", "Y1B1", &ctx.horizon);
        let bounds = n.angle_bounds(&ctx);
        assert_eq!(bounds[0].value, -PI);
        assert_eq!(bounds[1].value, PI);
        assert!(node("NGNY", "Y1B1", &ctx.horizon).angle_bounds(&ctx).is_empty());
    }

    #[test]
    fn test_scale() {
        let config = config();
        let h = config.horizon().unwrap();
        let mut n = node("ELNY", "Y1B1", &h);
        n.demand = Some(10.0);
        n.scale("demand".parse().unwrap(), 1.2);
        n.scale(NodeAttribute::PeakPower, 3.0);
        assert_eq!(n.demand, Some(12.0));
        assert_eq!(n.peak_power, None);
        assert!("voltage".parse::<NodeAttribute>().is_err());
    }
}
